//! Chat-platform abstraction for message I/O.

pub mod cli;
pub mod command;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;

pub use cli::CliChannel;
pub use command::{Command, CommandParser};

/// A message delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub participant_id: String,
    pub content: String,
    /// Authored by a bot account (including this engine).
    #[serde(default)]
    pub is_bot: bool,
}

impl IncomingMessage {
    pub fn new(guild_id: &str, channel_id: &str, participant_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            participant_id: participant_id.to_string(),
            content: content.to_string(),
            is_bot: false,
        }
    }

    pub fn from_bot(mut self) -> Self {
        self.is_bot = true;
        self
    }
}

pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// Calls the engine makes back into the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Platform name for logging.
    fn name(&self) -> &str;

    /// Remove a rejected candidate from the channel.
    async fn delete_message(&self, channel_id: &str, message_id: &str)
    -> Result<(), ChannelError>;

    /// Post a notice; with `auto_expire` set the platform removes it after that long.
    async fn send_notice(
        &self,
        channel_id: &str,
        text: &str,
        auto_expire: Option<Duration>,
    ) -> Result<(), ChannelError>;

    /// Mark an accepted candidate (a reaction on most platforms).
    async fn add_acknowledgement(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), ChannelError>;

    /// Whether `participant_id` may run elevated operations in `guild_id`.
    async fn is_authorized(&self, guild_id: &str, participant_id: &str) -> bool;

    /// How a participant is addressed in notices.
    fn mention(&self, participant_id: &str) -> String {
        format!("<@{participant_id}>")
    }
}
