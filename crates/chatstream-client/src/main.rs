use std::io::Write as _;

use anyhow::Result;
use chatstream_client::{ApiClient, ChatController, SendOutcome, format_countdown};
use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "chatstream", about = "Terminal chat client for a chatstream server")]
struct Cli {
    /// Base URL of the chatstream server
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.url);
    if !api.health().await.unwrap_or(false) {
        eprintln!("warning: server at {} is not responding", cli.url);
    }

    let mut controller = ChatController::new(api.clone());
    controller.on_delta(|delta| {
        print!("{delta}");
        let _ = std::io::stdout().flush();
    });

    println!(
        "chatstream connected to {}. /status shows your limit, Ctrl-D quits.",
        cli.url
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if line.trim() == "/status" {
            match api.rate_limit_status().await {
                Ok(status) => println!(
                    "limit {} / remaining {} / limited: {}",
                    status.limit, status.remaining, status.is_rate_limited
                ),
                Err(err) => println!("status check failed: {err}"),
            }
            continue;
        }

        if !controller.can_send(&line) {
            let rate_limit = controller.rate_limit();
            if rate_limit.is_blocked(Utc::now()) {
                println!(
                    "Rate limited, try again in {}",
                    format_countdown(rate_limit.seconds_until_reset(Utc::now()))
                );
            }
            continue;
        }

        match controller.send(&line).await? {
            SendOutcome::Completed => println!(),
            SendOutcome::RateLimited => {
                println!(
                    "{} (retry in {})",
                    controller.last_error().unwrap_or("Rate limited"),
                    format_countdown(
                        controller.rate_limit().seconds_until_reset(Utc::now())
                    )
                );
            }
            SendOutcome::Errored => {
                println!("{}", controller.last_error().unwrap_or("Request failed"));
            }
        }
    }

    Ok(())
}
