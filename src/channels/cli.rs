//! CLI channel: stdin/stdout REPL for local play.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{ChatPlatform, IncomingMessage, MessageStream};
use crate::error::ChannelError;

/// Reads candidates from stdin and prints engine output to stdout.
///
/// Everything typed lands in one fixed guild/channel pair.
pub struct CliChannel {
    guild_id: String,
    channel_id: String,
    staff: Vec<String>,
}

impl CliChannel {
    /// `staff` lists participants allowed to run elevated operations; `*` allows everyone.
    pub fn new(staff: Vec<String>) -> Self {
        Self {
            guild_id: "local".into(),
            channel_id: "counting".into(),
            staff,
        }
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn is_staff(&self, participant: &str) -> bool {
        self.staff.iter().any(|s| s == "*" || s == participant)
    }

    /// Stream of stdin lines as messages from `local-user`.
    pub fn start(&self) -> MessageStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let guild = self.guild_id.clone();
        let channel = self.channel_id.clone();

        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new(&guild, &channel, "local-user", &line);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Box::pin(stream)
    }

    /// Print a reply line and re-prompt.
    pub fn reply(&self, text: &str) {
        println!("{text}");
        eprint!("> ");
    }
}

#[async_trait]
impl ChatPlatform for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn delete_message(
        &self,
        _channel_id: &str,
        _message_id: &str,
    ) -> Result<(), ChannelError> {
        eprintln!("🗑  message removed");
        Ok(())
    }

    async fn send_notice(
        &self,
        _channel_id: &str,
        text: &str,
        _auto_expire: Option<Duration>,
    ) -> Result<(), ChannelError> {
        println!("{text}");
        Ok(())
    }

    async fn add_acknowledgement(
        &self,
        _channel_id: &str,
        _message_id: &str,
    ) -> Result<(), ChannelError> {
        eprintln!("✅");
        Ok(())
    }

    async fn is_authorized(&self, _guild_id: &str, participant_id: &str) -> bool {
        self.is_staff(participant_id)
    }

    fn mention(&self, participant_id: &str) -> String {
        format!("@{participant_id}")
    }
}
