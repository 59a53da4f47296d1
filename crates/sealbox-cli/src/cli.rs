use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use sealbox_core::VERSION;

/// Sealbox - seal OAuth secrets with the web application's admin password
#[derive(Parser)]
#[command(name = "sealbox")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "SEALBOX_CONFIG")]
    pub config: Option<String>,

    /// Application database holding the admin accounts (auth_user table)
    #[arg(long, global = true, env = "SEALBOX_ACCOUNTS_DB")]
    pub accounts_db: Option<String>,

    /// Admin/staff username (default: first superuser, else first staff account)
    #[arg(long, global = true, env = "SEALBOX_ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    /// Admin password (prompted for when omitted)
    #[arg(long, global = true, env = "SEALBOX_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Paths to the OAuth client secret, in plaintext and sealed form
#[derive(Args, Default)]
pub struct ClientSecretPathArgs {
    /// Plaintext OAuth client secret JSON
    #[arg(long, value_name = "PATH")]
    pub client_secret: Option<String>,

    /// Sealed client secret (default: <client-secret>.enc)
    #[arg(long, value_name = "PATH")]
    pub client_secret_enc: Option<String>,
}

/// Paths to the OAuth token, in plaintext and sealed form
#[derive(Args, Default)]
pub struct TokenPathArgs {
    /// Plaintext OAuth token JSON
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<String>,

    /// Sealed token (default: <token-file>.enc)
    #[arg(long, value_name = "PATH")]
    pub token_file_enc: Option<String>,
}

/// Arguments for the `seal` command
#[derive(Args)]
pub struct SealArgs {
    #[command(flatten)]
    pub client: ClientSecretPathArgs,

    #[command(flatten)]
    pub token: TokenPathArgs,
}

/// Arguments for the `encrypt` command
#[derive(Args)]
pub struct EncryptArgs {
    /// Plaintext file to seal
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output path (default: <INPUT>.enc)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,
}

/// Arguments for the `decrypt` command
#[derive(Args)]
pub struct DecryptArgs {
    /// Sealed file to open
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Write plaintext to this path instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `inspect` command
#[derive(Args)]
pub struct InspectArgs {
    /// Sealed file to describe
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `refresh-token` command
#[derive(Args)]
pub struct RefreshTokenArgs {
    #[command(flatten)]
    pub client: ClientSecretPathArgs,

    #[command(flatten)]
    pub token: TokenPathArgs,

    /// Store the new token sealed even if no sealed token exists yet
    #[arg(long)]
    pub write_encrypted: bool,

    /// Host for the local OAuth callback
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port for the local OAuth callback
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Manual flow: paste the final redirect URL containing code=...
    #[arg(long)]
    pub manual: bool,
}

/// Arguments for the `test-connection` command
#[derive(Args)]
pub struct TestConnectionArgs {
    #[command(flatten)]
    pub token: TokenPathArgs,

    /// Also list the first 10 mailbox labels
    #[arg(long)]
    pub labels: bool,
}

#[derive(Args)]
pub struct ScanMailArgs {
    #[command(flatten)]
    pub token: TokenPathArgs,

    /// Maximum number of messages to check
    #[arg(long, default_value_t = 200)]
    pub max: usize,

    /// Mailbox search filter, e.g. newer_than:30d
    #[arg(long, default_value = "")]
    pub query: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seal the OAuth client secret and token with the admin password
    Seal(SealArgs),

    /// Seal an arbitrary file
    Encrypt(EncryptArgs),

    /// Unseal a file to stdout or a path
    Decrypt(DecryptArgs),

    /// Show envelope metadata without unsealing
    Inspect(InspectArgs),

    /// Run the OAuth consent flow and store a new token
    RefreshToken(RefreshTokenArgs),

    /// Check the stored token against the mailbox API
    TestConnection(TestConnectionArgs),

    /// List messages containing wallet addresses or long hex strings
    ScanMail(ScanMailArgs),

    /// Show configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration
    Show,
}
