use crate::app::AppContext;
use crate::cli::TestConnectionArgs;
use crate::errors::CliError;
use crate::google::Profile;

use super::load_token;

const MAX_LABELS: usize = 10;

pub fn handle_test_connection(ctx: &AppContext, args: &TestConnectionArgs) -> anyhow::Result<()> {
    let token = load_token(ctx, &args.token)?;
    let access_token = token
        .access_token()
        .ok_or_else(|| CliError::invalid_input("Token carries no access token"))?;

    let gmail = ctx.gmail_client(access_token)?;
    let profile = gmail.profile()?;
    print_profile(&profile);

    if args.labels {
        let labels = gmail.labels()?;
        println!("Labels (max {}):", MAX_LABELS);
        for label in labels.iter().take(MAX_LABELS) {
            println!("- {}", label.name);
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("Mailbox API connection OK");
    println!(
        "Account: {}",
        profile.email_address.as_deref().unwrap_or("(no email)")
    );
    println!("Messages: {}", profile.messages_total);
    println!("Threads: {}", profile.threads_total);
}
