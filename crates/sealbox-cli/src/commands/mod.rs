mod files;
mod misc;
mod refresh_token;
mod scan_mail;
mod seal;
mod test_connection;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};
use zeroize::Zeroizing;

use sealbox_core::fs::write_atomic;
use sealbox_core::{AdminCredential, PasswordCipher, SecretCipher};

use crate::app::{AppContext, TokenPaths};
use crate::cli::TokenPathArgs;
use crate::errors::CliError;
use crate::google::{http_client, refresh_access_token, AuthorizedUserToken};

pub use files::{handle_decrypt, handle_encrypt, handle_inspect};
pub use misc::{handle_completions, handle_config};
pub use refresh_token::handle_refresh_token;
pub use scan_mail::handle_scan_mail;
pub use seal::handle_seal;
pub use test_connection::handle_test_connection;

/// Fail with a not-found error naming `what` unless `path` is a file.
pub(crate) fn require_file(path: &Path, what: &str) -> anyhow::Result<()> {
    if path.is_file() {
        return Ok(());
    }
    Err(CliError::not_found(
        format!("No {} file at {}", what, path.display()),
        "Hint: Check the path flags or the [gmail] section of the config.",
    )
    .into())
}

/// Read a plaintext secret file.
pub(crate) fn read_plain(path: &Path, what: &str) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    require_file(path, what)?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Zeroizing::new(bytes))
}

/// Unseal a sealed secret file with verified admin credentials.
pub(crate) fn read_sealed(
    cipher: &PasswordCipher,
    admin: &AdminCredential,
    path: &Path,
    what: &str,
) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let bytes = cipher
        .unseal_file(path, admin.password())
        .with_context(|| format!("Could not unseal the {}", what))?;
    Ok(Zeroizing::new(bytes))
}

/// Persist a token: sealed when admin credentials are given, else plaintext.
pub(crate) fn store_token(
    cipher: &PasswordCipher,
    admin: Option<&AdminCredential>,
    paths: &TokenPaths,
    token: &AuthorizedUserToken,
) -> anyhow::Result<PathBuf> {
    let json = Zeroizing::new(token.to_json()?);
    match admin {
        Some(admin) => {
            let envelope = cipher.seal(json.as_bytes(), admin.password())?;
            write_atomic(&paths.sealed, &envelope)
                .with_context(|| format!("Failed to write {}", paths.sealed.display()))?;
            Ok(paths.sealed.clone())
        }
        None => {
            write_atomic(&paths.plain, json.as_bytes())
                .with_context(|| format!("Failed to write {}", paths.plain.display()))?;
            Ok(paths.plain.clone())
        }
    }
}

/// Load the stored token, sealed copy first, refreshing it when expired.
///
/// A refreshed token is written back in the form it was read, so a sealed
/// token is re-sealed under a fresh salt and never lands in plaintext.
pub(crate) fn load_token(ctx: &AppContext, args: &TokenPathArgs) -> anyhow::Result<AuthorizedUserToken> {
    let paths = ctx.token_paths(args)?;
    let using_sealed = paths.sealed.exists();
    debug!(sealed = using_sealed, "loading OAuth token");

    let admin = if using_sealed {
        Some(ctx.resolve_admin()?)
    } else {
        None
    };
    let cipher = ctx.cipher()?;
    let raw = match admin.as_ref() {
        Some(admin) => read_sealed(&cipher, admin, &paths.sealed, "token")?,
        None => read_plain(&paths.plain, "token")?,
    };
    let mut token = AuthorizedUserToken::from_json(&raw)
        .map_err(|e| CliError::invalid_input(format!("Could not read the OAuth token: {}", e)))?;

    if token.is_expired() && token.can_refresh() {
        let response = refresh_access_token(&http_client()?, &token)
            .context("Token expired and could not be refreshed")?;
        token.apply_refresh(response);
        let stored = store_token(&cipher, admin.as_ref(), &paths, &token)?;
        info!(path = %stored.display(), "stored refreshed token");
    }

    if !token.is_valid() {
        return Err(CliError::invalid_input(
            "Invalid credentials: renew OAuth consent with `sealbox refresh-token`",
        )
        .into());
    }
    Ok(token)
}
