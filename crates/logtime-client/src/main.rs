//! `logtime-send [--user-id N] [MESSAGE]...`
//!
//! Posts each message to the logtime server and prints the stored record.
//! With no messages it sends two sample key presses.

use anyhow::{Context, Result};

use logtime_client::{DEFAULT_SERVER_URL, LogClient};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logtime_client=info".into()),
        )
        .init();

    let (user_id, mut messages) = parse_args(std::env::args().skip(1))?;
    if messages.is_empty() {
        messages = vec!["key: A".to_string(), "key: B".to_string()];
    }

    let server_url = std::env::var("LOGTIME_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.into());
    let client = LogClient::new(server_url);

    for message in &messages {
        let log = client.send_log(message, user_id).await?;
        println!("sent: {} -> response: {}", message, serde_json::to_string(&log)?);
    }

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(Option<i64>, Vec<String>)> {
    let mut user_id = None;
    let mut messages = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--user-id" {
            let raw = args.next().context("--user-id needs a value")?;
            user_id = Some(raw.parse().with_context(|| format!("bad user id '{}'", raw))?);
        } else {
            messages.push(arg);
        }
    }

    Ok((user_id, messages))
}
