//! Guild registry: the single owner of all counting state.
//!
//! Serialized shape matches the persisted document:
//! `{ guild_id: { "channels": { channel_id: { ...session fields } } } }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ChannelSession;

/// Sessions of one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildSessions {
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelSession>,
}

/// Map from guild id to channel id to session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildRegistry {
    guilds: BTreeMap<String, GuildSessions>,
}

impl GuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: &str, channel_id: &str) -> Option<&ChannelSession> {
        self.guilds.get(guild_id)?.channels.get(channel_id)
    }

    pub fn get_mut(&mut self, guild_id: &str, channel_id: &str) -> Option<&mut ChannelSession> {
        self.guilds.get_mut(guild_id)?.channels.get_mut(channel_id)
    }

    pub fn contains(&self, guild_id: &str, channel_id: &str) -> bool {
        self.get(guild_id, channel_id).is_some()
    }

    /// Insert or replace the session for a channel, returning the previous one.
    pub fn insert(
        &mut self,
        guild_id: &str,
        channel_id: &str,
        session: ChannelSession,
    ) -> Option<ChannelSession> {
        self.guilds
            .entry(guild_id.to_string())
            .or_default()
            .channels
            .insert(channel_id.to_string(), session)
    }

    pub fn remove(&mut self, guild_id: &str, channel_id: &str) -> Option<ChannelSession> {
        self.guilds.get_mut(guild_id)?.channels.remove(channel_id)
    }

    /// Every session as `(guild_id, channel_id, session)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ChannelSession)> {
        self.guilds.iter().flat_map(|(guild, sessions)| {
            sessions
                .channels
                .iter()
                .map(move |(channel, session)| (guild.as_str(), channel.as_str(), session))
        })
    }

    pub fn session_count(&self) -> usize {
        self.guilds.values().map(|g| g.channels.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.session_count() == 0
    }
}
