//! Reservation Agent - interactive shell entry point.
//!
//! Reads user utterances from stdin and prints the assistant's answers.

use std::sync::Arc;

use reservation_agent::{
    agent::Agent, config::Config, llm::OllamaClient, reservations::ReservationBook,
    tools::ToolRegistry,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging on stderr so the conversation stays readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reservation_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={} backend={}",
        config.default_model, config.model_base_url
    );

    let today = chrono::Local::now().date_naive();
    let book = Arc::new(ReservationBook::new(
        today,
        &config.schedule,
        config.booking_policy,
    ));
    let llm = Arc::new(OllamaClient::new(config.model_base_url.clone()));
    let mut agent = Agent::new((&config).into(), llm, ToolRegistry::new(book));

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(
            format!(
                "Assistant: Welcome to {}! How can I help you today?\n",
                config.restaurant_name
            )
            .as_bytes(),
        )
        .await?;

    loop {
        stdout.write_all(b"User: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit") {
            stdout.write_all(b"Goodbye!\n").await?;
            break;
        }

        let reply = match agent.respond(input).await {
            Ok(answer) => format!("Assistant: {}\n", answer),
            Err(e) => format!("Error {}\n", e),
        };
        stdout.write_all(reply.as_bytes()).await?;
    }

    Ok(())
}
