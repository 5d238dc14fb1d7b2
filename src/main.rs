use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use counting_engine::channels::command::HELP;
use counting_engine::channels::{CliChannel, Command, CommandParser, IncomingMessage};
use counting_engine::config::EngineConfig;
use counting_engine::engine::{self, CountingEngine, SubmitOutcome};
use counting_engine::session::parse_int_list;
use counting_engine::store::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; COUNTING_LOG_DIR adds a daily rolling log file
    let (file_layer, _log_guard) = match std::env::var("COUNTING_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "counting.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    let config = EngineConfig::from_env().context("invalid COUNTING_* configuration")?;

    let staff: Vec<String> = std::env::var("COUNTING_STAFF")
        .unwrap_or_else(|_| "*".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    eprintln!("🔢 Counting Engine v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data: {}", config.data_path.display());
    eprintln!("   Type /help for commands, /quit to exit.\n");

    let cli = Arc::new(CliChannel::new(staff));
    let store = Arc::new(JsonFileStore::new(config.data_path.clone()));
    let engine = Arc::new(
        CountingEngine::load(store, cli.clone(), config)
            .await
            .context("failed to load counting data")?,
    );
    let status = engine::spawn_status_task(engine.clone());

    let guild = cli.guild_id().to_string();
    let channel = cli.channel_id().to_string();
    let mut participant = "local-user".to_string();
    let mut messages = cli.start();

    while let Some(msg) = messages.next().await {
        let command = CommandParser::parse(&msg.content);
        let result = match command {
            Command::Quit => break,
            Command::Help => {
                cli.reply(HELP);
                continue;
            }
            Command::As(name) => {
                cli.reply(&format!("Now counting as {name}."));
                participant = name;
                continue;
            }
            Command::Candidate(content) => {
                let msg = IncomingMessage {
                    participant_id: participant.clone(),
                    content,
                    ..msg
                };
                let outcome = engine.submit_candidate(&msg).await;
                if outcome == SubmitOutcome::Ignored {
                    cli.reply("No counting game here, start one with /start <mode>.");
                } else {
                    eprint!("> ");
                }
                continue;
            }
            Command::Start { mode, args } => engine
                .start(&guild, &channel, &participant, &mode, &args)
                .await
                .map(|_| ()),
            Command::Reload { mode, args } => engine
                .reload(&guild, &channel, &participant, &mode, &args)
                .await
                .map(|_| ()),
            Command::End => engine.end(&guild, &channel, &participant).await,
            Command::Reset => engine.reset(&guild, &channel, &participant).await,
            Command::ToggleTurns => engine
                .toggle_turns(&guild, &channel, &participant)
                .await
                .map(|_| ()),
            Command::ToggleResetOnWrong => engine
                .toggle_reset_on_wrong(&guild, &channel, &participant)
                .await
                .map(|_| ()),
            Command::SetSkipNumbers(raw) => match parse_int_list("skip_numbers", &raw) {
                Ok(numbers) => {
                    engine
                        .set_skip_numbers(&guild, &channel, &participant, numbers)
                        .await
                }
                Err(e) => Err(e.into()),
            },
            Command::Leaderboard => engine.info(&guild, &channel).await.map(|s| {
                let rows = s.leaderboard.top(10);
                if rows.is_empty() {
                    println!("No counts have been made yet.");
                }
                for row in &rows {
                    println!("{}. {} ({} counts)", row.rank, row.participant_id, row.count);
                }
            }),
            Command::Info => engine.info(&guild, &channel).await.map(|s| {
                println!("Mode: {}", s.mode);
                println!("Current Count: {}", s.current_value);
                println!("Taking Turns Mode: {}", s.taking_turns);
                println!("Reset on Wrong Count: {}", s.reset_on_wrong);
                println!("Step: {}", s.step);
            }),
        };

        match result {
            Ok(()) => eprint!("> "),
            Err(e) => cli.reply(&format!("⚠️  {e}")),
        }
    }

    status.abort();
    if !engine.is_durable() {
        tracing::warn!("Exiting with unsaved counting data");
    }
    eprintln!("\n👋 Goodbye!");
    Ok(())
}
