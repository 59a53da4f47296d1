use anyhow::Context;
use tracing::info;

use sealbox_core::SecretCipher;

use crate::app::AppContext;
use crate::cli::SealArgs;

use super::require_file;

pub fn handle_seal(ctx: &AppContext, args: &SealArgs) -> anyhow::Result<()> {
    let client = ctx.client_secret_paths(&args.client)?;
    let token = ctx.token_paths(&args.token)?;
    require_file(&client.plain, "plaintext client secret")?;
    require_file(&token.plain, "plaintext token")?;

    let admin = ctx.resolve_admin()?;
    let cipher = ctx.cipher()?;

    cipher
        .seal_file(&client.plain, &client.sealed, admin.password())
        .context("Could not seal the client secret")?;
    cipher
        .seal_file(&token.plain, &token.sealed, admin.password())
        .context("Could not seal the token")?;
    info!(
        client_secret = %client.sealed.display(),
        token = %token.sealed.display(),
        "sealed OAuth secrets"
    );

    if !ctx.quiet() {
        println!("Secrets sealed.");
        println!("Admin verified: {}", admin.username());
        println!("Sealed client secret: {}", client.sealed.display());
        println!("Sealed token: {}", token.sealed.display());
        eprintln!("Warning: remove the plaintext files from version control before pushing.");
    }
    Ok(())
}
