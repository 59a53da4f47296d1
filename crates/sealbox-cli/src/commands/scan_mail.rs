use tracing::{debug, info};

use crate::app::AppContext;
use crate::cli::ScanMailArgs;
use crate::errors::CliError;
use crate::google::{Message, MAX_PAGE_SIZE};
use crate::scan::find_crypto_tokens;

use super::load_token;

const RULE_WIDTH: usize = 90;

pub fn handle_scan_mail(ctx: &AppContext, args: &ScanMailArgs) -> anyhow::Result<()> {
    if args.max == 0 {
        return Err(CliError::invalid_input("--max must be at least 1").into());
    }
    let token = load_token(ctx, &args.token)?;
    let access_token = token
        .access_token()
        .ok_or_else(|| CliError::invalid_input("Token carries no access token"))?;
    let gmail = ctx.gmail_client(access_token)?;

    let listed = gmail.list_messages(&args.query, args.max.min(MAX_PAGE_SIZE))?;
    debug!(listed = listed.len(), query = %args.query, "listed messages");

    let mut checked = 0usize;
    let mut flagged = 0usize;
    for entry in listed.iter().take(args.max) {
        checked += 1;
        let message = gmail.message(&entry.id)?;
        let tokens = find_crypto_tokens(&message.text());
        if tokens.is_empty() {
            continue;
        }
        flagged += 1;
        print_match(&message, &tokens);
    }

    info!(checked, flagged, "mail scan finished");
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("Messages checked: {}", checked);
    println!("Messages with crypto matches: {}", flagged);
    Ok(())
}

fn print_match(message: &Message, tokens: &[String]) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("Message ID: {}", message.id);
    println!("Date      : {}", message.header("Date"));
    println!("From      : {}", message.header("From"));
    println!("Subject   : {}", message.header("Subject"));
    println!("Matches   :");
    for token in tokens {
        println!("  - {}", token);
    }
}
