//! Demo that routes and parses the bundled fixture emails, printing the
//! extracted candidates as JSON.

use newsletter_harvester::config::HarvestSettings;
use newsletter_harvester::ingest::mailbox::{FixtureMailbox, MailSource};
use newsletter_harvester::ingest::parsers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let settings = HarvestSettings::default();
    let registry = parsers::default_registry(&settings);

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/emails.json".to_string());
    let mailbox = FixtureMailbox::from_json_file(&path)?;

    for msg in mailbox.fetch_unread().await? {
        match registry.find_parser(&msg.from) {
            Some(route) => {
                let parsed = route.strategy.parse(&msg);
                println!(
                    "{} -> {} ({} candidates)",
                    msg.from,
                    route.source,
                    parsed.candidates.len()
                );
                println!("{}", serde_json::to_string_pretty(&parsed.candidates)?);
            }
            None => println!("{} -> no parser", msg.from),
        }
    }

    println!("extract-demo done");
    Ok(())
}
