use std::io::BufRead;

use anyhow::Context;
use tracing::info;

use crate::app::AppContext;
use crate::cli::RefreshTokenArgs;
use crate::errors::CliError;
use crate::google::{extract_code, AuthorizedUserToken, CallbackListener, OAuthClient, OAuthFlow};

use super::{read_plain, read_sealed, store_token};

pub fn handle_refresh_token(ctx: &AppContext, args: &RefreshTokenArgs) -> anyhow::Result<()> {
    let client_paths = ctx.client_secret_paths(&args.client)?;
    let token_paths = ctx.token_paths(&args.token)?;

    let use_sealed_client = client_paths.sealed.exists();
    let seal_result = token_paths.sealed.exists() || args.write_encrypted;
    let admin = if use_sealed_client || seal_result {
        Some(ctx.resolve_admin()?)
    } else {
        None
    };
    let cipher = ctx.cipher()?;

    let client_json = match admin.as_ref().filter(|_| use_sealed_client) {
        Some(admin) => read_sealed(&cipher, admin, &client_paths.sealed, "client secret")?,
        None => read_plain(&client_paths.plain, "client secret")?,
    };
    let client = OAuthClient::from_json(&client_json)?;
    let scopes = ctx.scopes()?;

    let token = if args.manual {
        let flow = OAuthFlow::new(client, scopes, format!("http://{}:{}/", args.host, args.port))?;
        let request = flow.start()?;
        println!("Open this URL in your browser and authorize access:");
        println!("{}", request.url);
        println!();
        println!("When done, copy the final redirect URL (the one containing ?code=...) and paste it here.");
        let pasted = read_redirect_url(ctx)?;
        if pasted.trim().is_empty() {
            return Err(CliError::invalid_input("No redirect URL received").into());
        }
        let code = extract_code(&pasted, &request.state)?;
        let response = flow.exchange(&code, &request.pkce.verifier)?;
        AuthorizedUserToken::from_exchange(flow.client(), flow.scopes(), response)
    } else {
        let listener = CallbackListener::bind(&args.host, args.port)?;
        let redirect_uri = listener.redirect_uri();
        let flow = OAuthFlow::new(client, scopes, redirect_uri.clone())?;
        let request = flow.start()?;
        println!("Starting OAuth on {} (waiting for callback)...", redirect_uri);
        println!("Open this URL in your browser and authorize access:");
        println!("{}", request.url);
        println!();
        let code = listener.wait_for_code(&request.state)?;
        let response = flow.exchange(&code, &request.pkce.verifier)?;
        AuthorizedUserToken::from_exchange(flow.client(), flow.scopes(), response)
    };

    let stored = store_token(&cipher, admin.as_ref().filter(|_| seal_result), &token_paths, &token)?;
    info!(path = %stored.display(), sealed = seal_result, "stored OAuth token");

    let access_token = token
        .access_token()
        .ok_or_else(|| CliError::remote("Token response carried no access token"))?;
    let profile = ctx
        .gmail_client(access_token)?
        .profile()
        .context("Token stored but the mailbox profile request failed")?;

    if !ctx.quiet() {
        println!("OAuth token generated and stored.");
        println!(
            "Authenticated account: {}",
            profile.email_address.as_deref().unwrap_or("(no email)")
        );
        if seal_result {
            println!("Sealed token: {}", stored.display());
        } else {
            println!("Plaintext token: {}", stored.display());
        }
    }
    Ok(())
}

fn read_redirect_url(ctx: &AppContext) -> anyhow::Result<String> {
    if ctx.interactive() {
        let value: String = dialoguer::Input::new()
            .with_prompt("Redirect URL")
            .allow_empty(true)
            .interact_text()?;
        return Ok(value);
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
