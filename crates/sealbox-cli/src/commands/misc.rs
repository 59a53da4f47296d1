use clap::CommandFactory;
use clap_complete::generate;

use crate::app::AppContext;
use crate::cli::{Cli, ConfigCommand};
use crate::config::render_config;

pub fn handle_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "sealbox", &mut std::io::stdout());
    Ok(())
}

pub fn handle_config(ctx: &AppContext, command: &ConfigCommand) -> anyhow::Result<()> {
    let loaded = ctx.config()?;
    match command {
        ConfigCommand::Path => println!("{}", loaded.path.display()),
        ConfigCommand::Show => {
            if !loaded.exists && !ctx.quiet() {
                println!("# {} not found; showing defaults", loaded.path.display());
            }
            print!("{}", render_config(&loaded.config)?);
        }
    }
    Ok(())
}
