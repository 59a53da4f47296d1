//! Sealbox CLI - seal OAuth secrets with the web application's admin password
//!
//! This is the command-line interface for Sealbox. It wires the core sealing
//! library to the application's credential database and the mailbox OAuth flow.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod google;
mod scan;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::errors::{auth_hint, exit_code_for};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let ctx = AppContext::new(&cli);

    if let Err(err) = run(&ctx) {
        eprintln!("Error: {:#}", err);
        if let Some(hint) = auth_hint(&err) {
            eprintln!("{}", hint);
        }
        std::process::exit(exit_code_for(&err));
    }
}

/// `-v`/`-vv` win over `RUST_LOG`; otherwise `RUST_LOG`, else warnings only.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if quiet { "error" } else { "warn" })),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(ctx: &AppContext) -> anyhow::Result<()> {
    match &ctx.cli().command {
        Commands::Seal(args) => commands::handle_seal(ctx, args),
        Commands::Encrypt(args) => commands::handle_encrypt(ctx, args),
        Commands::Decrypt(args) => commands::handle_decrypt(ctx, args),
        Commands::Inspect(args) => commands::handle_inspect(ctx, args),
        Commands::RefreshToken(args) => commands::handle_refresh_token(ctx, args),
        Commands::TestConnection(args) => commands::handle_test_connection(ctx, args),
        Commands::ScanMail(args) => commands::handle_scan_mail(ctx, args),
        Commands::Config { command } => commands::handle_config(ctx, command),
        Commands::Completions { shell } => commands::handle_completions(*shell),
    }
}
