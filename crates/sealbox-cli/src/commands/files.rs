use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use sealbox_core::fs::write_atomic;
use sealbox_core::{SealedSecret, SecretCipher};

use crate::app::{sealed_path_for, AppContext};
use crate::cli::{DecryptArgs, EncryptArgs, InspectArgs};
use crate::errors::CliError;

use super::{read_sealed, require_file};

pub fn handle_encrypt(ctx: &AppContext, args: &EncryptArgs) -> anyhow::Result<()> {
    let input = PathBuf::from(&args.input);
    require_file(&input, "input")?;
    let output = args
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| sealed_path_for(&input));

    let admin = ctx.resolve_admin()?;
    ctx.cipher()?
        .seal_file(&input, &output, admin.password())
        .with_context(|| format!("Could not seal {}", input.display()))?;

    if !ctx.quiet() {
        println!("Sealed {} -> {}", input.display(), output.display());
    }
    Ok(())
}

pub fn handle_decrypt(ctx: &AppContext, args: &DecryptArgs) -> anyhow::Result<()> {
    let input = PathBuf::from(&args.input);
    require_file(&input, "sealed")?;
    let output = args.output.as_ref().map(PathBuf::from);
    if let Some(path) = output.as_deref() {
        if path.exists() && !args.force {
            return Err(CliError::invalid_input(format!(
                "{} already exists; pass --force to overwrite",
                path.display()
            ))
            .into());
        }
    }

    let admin = ctx.resolve_admin()?;
    let cipher = ctx.cipher()?;
    let plaintext = read_sealed(&cipher, &admin, &input, "input file")?;

    match output {
        Some(path) => {
            write_atomic(&path, &plaintext)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !ctx.quiet() {
                eprintln!("Unsealed {} -> {}", input.display(), path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub fn handle_inspect(_ctx: &AppContext, args: &InspectArgs) -> anyhow::Result<()> {
    let input = Path::new(&args.input);
    require_file(input, "sealed")?;
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let envelope = SealedSecret::from_bytes(&bytes)?;

    if args.json {
        let value = serde_json::json!({
            "path": input.display().to_string(),
            "version": envelope.version(),
            "iterations": envelope.iterations(),
            "salt_bytes": envelope.salt().len(),
            "token_chars": envelope.token().len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("File: {}", input.display());
        println!("Envelope version: {}", envelope.version());
        println!("KDF iterations: {}", envelope.iterations());
        println!("Salt: {} bytes", envelope.salt().len());
        println!("Token: {} chars", envelope.token().len());
    }
    Ok(())
}
