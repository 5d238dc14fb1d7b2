//! Counting engine: owns the guild registry and runs every counting operation.
//!
//! All mutations go through one `tokio::sync::Mutex` around the whole
//! registry, across every guild and channel. Candidate parsing runs before
//! the lock is taken; the decision, the mutation, the persistence write and
//! the rejection side effects (delete + notice) all happen while it is held.
//! Acknowledgements and management confirmations are sent after release.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::channels::{ChatPlatform, IncomingMessage};
use crate::config::EngineConfig;
use crate::error::{ConfigError, ParseError, Result, SessionError};
use crate::parser::{ParseOutcome, parse_candidate};
use crate::session::{
    ChannelSession, CountingMode, GuildRegistry, LeaderboardEntry, ModeConfig, RuleViolation,
};
use crate::store::SessionStore;

/// Result of offering one candidate message to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Committed as the new current value.
    Accepted { value: i64 },
    /// Parsed, but not the expected value. `None` when the sequence has no next value.
    RejectedWrong { expected: Option<i64> },
    /// Same participant as the previous accepted count while taking turns.
    RejectedTurn,
    RejectedParse(ParseError),
    /// Correct in sequence but broke the mode's extra rule.
    RejectedRule(RuleViolation),
    /// Wrong value with reset-on-wrong enabled; the session is back at its baseline.
    Reset { expected: Option<i64> },
    /// Bot message, or no session in the channel.
    Ignored,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Whether the outcome changed session state.
    fn is_mutation(&self) -> bool {
        matches!(self, Self::Accepted { .. } | Self::Reset { .. })
    }

    /// Whether the candidate message is removed from the channel.
    fn deletes_candidate(&self) -> bool {
        !matches!(self, Self::Accepted { .. } | Self::Ignored)
    }
}

pub struct CountingEngine {
    registry: Mutex<GuildRegistry>,
    store: Arc<dyn SessionStore>,
    platform: Arc<dyn ChatPlatform>,
    config: EngineConfig,
    durable: AtomicBool,
}

impl CountingEngine {
    /// Engine over an already loaded registry.
    pub fn new(
        registry: GuildRegistry,
        store: Arc<dyn SessionStore>,
        platform: Arc<dyn ChatPlatform>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: Mutex::new(registry),
            store,
            platform,
            config,
            durable: AtomicBool::new(true),
        }
    }

    /// Load the registry from `store` and build the engine around it.
    pub async fn load(
        store: Arc<dyn SessionStore>,
        platform: Arc<dyn ChatPlatform>,
        config: EngineConfig,
    ) -> Result<Self> {
        let registry = store.load().await?;
        info!(
            sessions = registry.session_count(),
            platform = platform.name(),
            "Counting engine ready"
        );
        Ok(Self::new(registry, store, platform, config))
    }

    /// False once a persistence write has failed, until the next write succeeds.
    pub fn is_durable(&self) -> bool {
        self.durable.load(Ordering::SeqCst)
    }

    /// Number of channels with an active session.
    pub async fn session_count(&self) -> usize {
        self.registry.lock().await.session_count()
    }

    // ── Management operations ──────────────────────────────────────────

    /// Start a session in `channel_id`. `args` carries the mode's parameter
    /// (the multiple, or the custom sequence).
    pub async fn start(
        &self,
        guild_id: &str,
        channel_id: &str,
        actor: &str,
        mode: &str,
        args: &str,
    ) -> Result<ChannelSession> {
        self.authorize(guild_id, actor).await?;

        let session = {
            let mut registry = self.registry.lock().await;
            if registry.contains(guild_id, channel_id) {
                return Err(SessionError::AlreadyActive {
                    channel: channel_id.to_string(),
                }
                .into());
            }
            let session = ChannelSession::new(ModeConfig::parse(mode, args)?, &self.config);
            registry.insert(guild_id, channel_id, session.clone());
            self.persist(&registry).await;
            session
        };

        info!(
            guild = %guild_id,
            channel = %channel_id,
            mode = %session.mode,
            actor = %actor,
            "Counting session started"
        );
        self.confirm(
            channel_id,
            &format!("Started a **{}** counting match!", capitalize(session.mode.as_str())),
        )
        .await;
        Ok(session)
    }

    /// Replace the running session with a fresh one in `mode`.
    pub async fn reload(
        &self,
        guild_id: &str,
        channel_id: &str,
        actor: &str,
        mode: &str,
        args: &str,
    ) -> Result<ChannelSession> {
        self.authorize(guild_id, actor).await?;
        let config = ModeConfig::parse(mode, args)?;

        let session = {
            let mut registry = self.registry.lock().await;
            if !registry.contains(guild_id, channel_id) {
                return Err(not_active(channel_id));
            }
            let session = ChannelSession::new(config, &self.config);
            registry.insert(guild_id, channel_id, session.clone());
            self.persist(&registry).await;
            session
        };

        info!(guild = %guild_id, channel = %channel_id, mode = %session.mode, "Counting session reloaded");
        self.confirm(
            channel_id,
            &format!("Reloaded the counting match as **{}**.", capitalize(session.mode.as_str())),
        )
        .await;
        Ok(session)
    }

    /// Remove the session; later candidates in the channel are ignored.
    pub async fn end(&self, guild_id: &str, channel_id: &str, actor: &str) -> Result<()> {
        self.authorize(guild_id, actor).await?;
        {
            let mut registry = self.registry.lock().await;
            if registry.remove(guild_id, channel_id).is_none() {
                return Err(not_active(channel_id));
            }
            self.persist(&registry).await;
        }

        info!(guild = %guild_id, channel = %channel_id, actor = %actor, "Counting session ended");
        self.confirm(channel_id, "Ended the counting match.").await;
        Ok(())
    }

    /// Back to the baseline, keeping the configuration.
    pub async fn reset(&self, guild_id: &str, channel_id: &str, actor: &str) -> Result<()> {
        self.authorize(guild_id, actor).await?;
        self.mutate(guild_id, channel_id, |session| session.reset()).await?;

        info!(guild = %guild_id, channel = %channel_id, actor = %actor, "Counting session reset");
        self.confirm(channel_id, "The count has been reset.").await;
        Ok(())
    }

    /// Flip taking-turns; returns the new setting.
    pub async fn toggle_turns(&self, guild_id: &str, channel_id: &str, actor: &str) -> Result<bool> {
        self.authorize(guild_id, actor).await?;
        let enabled = self
            .mutate(guild_id, channel_id, |session| {
                session.taking_turns = !session.taking_turns;
                session.taking_turns
            })
            .await?;

        info!(guild = %guild_id, channel = %channel_id, enabled, "Taking turns toggled");
        self.confirm(
            channel_id,
            &format!("'Taking turns' mode has been {}.", enabled_word(enabled)),
        )
        .await;
        Ok(enabled)
    }

    /// Flip reset-on-wrong; returns the new setting.
    pub async fn toggle_reset_on_wrong(
        &self,
        guild_id: &str,
        channel_id: &str,
        actor: &str,
    ) -> Result<bool> {
        self.authorize(guild_id, actor).await?;
        let enabled = self
            .mutate(guild_id, channel_id, |session| {
                session.reset_on_wrong = !session.reset_on_wrong;
                session.reset_on_wrong
            })
            .await?;

        info!(guild = %guild_id, channel = %channel_id, enabled, "Reset on wrong count toggled");
        self.confirm(
            channel_id,
            &format!("'Reset on wrong count' has been {}.", enabled_word(enabled)),
        )
        .await;
        Ok(enabled)
    }

    /// Replace the skip set of a `skip` session.
    pub async fn set_skip_numbers(
        &self,
        guild_id: &str,
        channel_id: &str,
        actor: &str,
        numbers: Vec<i64>,
    ) -> Result<()> {
        self.authorize(guild_id, actor).await?;
        {
            let mut registry = self.registry.lock().await;
            let session = registry
                .get_mut(guild_id, channel_id)
                .ok_or_else(|| not_active(channel_id))?;
            if session.mode != CountingMode::Skip {
                return Err(ConfigError::ModeMismatch {
                    expected: CountingMode::Skip.to_string(),
                    actual: session.mode.to_string(),
                }
                .into());
            }
            session.skip_set = numbers.iter().copied().collect();
            self.persist(&registry).await;
        }

        info!(guild = %guild_id, channel = %channel_id, ?numbers, "Skip numbers updated");
        self.confirm(channel_id, &format!("Skip numbers updated to: {numbers:?}"))
            .await;
        Ok(())
    }

    // ── Read operations ────────────────────────────────────────────────

    /// Ranked standings, ties in first-scored order.
    pub async fn leaderboard(&self, guild_id: &str, channel_id: &str) -> Result<Vec<LeaderboardEntry>> {
        let registry = self.registry.lock().await;
        let session = registry
            .get(guild_id, channel_id)
            .ok_or_else(|| not_active(channel_id))?;
        Ok(session.leaderboard.ranked())
    }

    /// Snapshot of the session.
    pub async fn info(&self, guild_id: &str, channel_id: &str) -> Result<ChannelSession> {
        let registry = self.registry.lock().await;
        registry
            .get(guild_id, channel_id)
            .cloned()
            .ok_or_else(|| not_active(channel_id))
    }

    // ── Counting ───────────────────────────────────────────────────────

    /// Validate one message against its channel's session and commit or reject it.
    pub async fn submit_candidate(&self, msg: &IncomingMessage) -> SubmitOutcome {
        if msg.is_bot {
            return SubmitOutcome::Ignored;
        }

        let parsed = parse_candidate(&msg.content);

        let mut registry = self.registry.lock().await;
        let Some(session) = registry.get_mut(&msg.guild_id, &msg.channel_id) else {
            return SubmitOutcome::Ignored;
        };
        let outcome = judge(session, parsed, &msg.participant_id);

        debug!(
            guild = %msg.guild_id,
            channel = %msg.channel_id,
            participant = %msg.participant_id,
            outcome = ?outcome,
            "Candidate judged"
        );

        if outcome.is_mutation() {
            self.persist(&registry).await;
        }
        if matches!(outcome, SubmitOutcome::Reset { .. }) {
            info!(guild = %msg.guild_id, channel = %msg.channel_id, "Wrong count, session reset");
        }

        if outcome.deletes_candidate() {
            if let Err(e) = self.platform.delete_message(&msg.channel_id, &msg.id).await {
                warn!(channel = %msg.channel_id, error = %e, "Could not delete rejected candidate");
            }
            if let Some(text) = self.rejection_notice(&outcome, &msg.participant_id) {
                self.notify(&msg.channel_id, &text, self.config.notice_ttl).await;
            }
        }
        drop(registry);

        if outcome.is_accepted() {
            if let Err(e) = self.platform.add_acknowledgement(&msg.channel_id, &msg.id).await {
                warn!(channel = %msg.channel_id, error = %e, "Could not acknowledge count");
            }
        }

        outcome
    }

    fn rejection_notice(&self, outcome: &SubmitOutcome, participant: &str) -> Option<String> {
        let mention = self.platform.mention(participant);
        let text = match outcome {
            SubmitOutcome::RejectedParse(_) => {
                format!("{mention}, please send a valid number or mathematical expression.")
            }
            SubmitOutcome::RejectedWrong { expected: Some(n) } => {
                format!("{mention}, incorrect count! The next number should be {n}.")
            }
            SubmitOutcome::RejectedWrong { expected: None } => {
                format!("{mention}, incorrect count! The sequence has no next number.")
            }
            SubmitOutcome::Reset { .. } => {
                format!("{mention}, incorrect count! The count has been reset.")
            }
            SubmitOutcome::RejectedTurn => format!("{mention}, you cannot count twice in a row!"),
            SubmitOutcome::RejectedRule(RuleViolation::NotMultiple(m)) => {
                format!("{mention}, please count in multiples of {m}.")
            }
            SubmitOutcome::RejectedRule(RuleViolation::NotPrime) => {
                format!("{mention}, please count prime numbers only.")
            }
            SubmitOutcome::Accepted { .. } | SubmitOutcome::Ignored => return None,
        };
        Some(text)
    }

    // ── Internals ──────────────────────────────────────────────────────

    async fn authorize(&self, guild_id: &str, actor: &str) -> Result<()> {
        if self.platform.is_authorized(guild_id, actor).await {
            Ok(())
        } else {
            warn!(guild = %guild_id, actor = %actor, "Unauthorized counting command");
            Err(SessionError::Unauthorized {
                participant: actor.to_string(),
            }
            .into())
        }
    }

    /// Apply `f` to an existing session and persist.
    async fn mutate<T>(
        &self,
        guild_id: &str,
        channel_id: &str,
        f: impl FnOnce(&mut ChannelSession) -> T,
    ) -> Result<T> {
        let mut registry = self.registry.lock().await;
        let session = registry
            .get_mut(guild_id, channel_id)
            .ok_or_else(|| not_active(channel_id))?;
        let value = f(session);
        self.persist(&registry).await;
        Ok(value)
    }

    /// Write-through save. Failures are logged and mark the engine non-durable;
    /// the in-memory state stays authoritative.
    async fn persist(&self, registry: &GuildRegistry) {
        match self.store.save(registry).await {
            Ok(()) => {
                if !self.durable.swap(true, Ordering::SeqCst) {
                    info!("Counting data persisted again");
                }
            }
            Err(e) => {
                self.durable.store(false, Ordering::SeqCst);
                error!(error = %e, "Failed to save counting data, changes are held in memory only");
            }
        }
    }

    async fn notify(&self, channel_id: &str, text: &str, ttl: Duration) {
        if let Err(e) = self.platform.send_notice(channel_id, text, Some(ttl)).await {
            warn!(channel = %channel_id, error = %e, "Could not send notice");
        }
    }

    async fn confirm(&self, channel_id: &str, text: &str) {
        self.notify(channel_id, text, self.config.command_notice_ttl).await;
    }
}

/// Decide the fate of a parsed candidate and apply it to `session`.
///
/// Check order: parse, expected value (reset when configured), turn, mode rule.
fn judge(session: &mut ChannelSession, parsed: ParseOutcome, participant: &str) -> SubmitOutcome {
    let value = match parsed {
        Ok(value) => value,
        Err(e) => return SubmitOutcome::RejectedParse(e),
    };

    let expected = session.expected_next(&mut rand::thread_rng());
    if expected != Some(value) {
        if session.reset_on_wrong {
            session.reset();
            return SubmitOutcome::Reset { expected };
        }
        return SubmitOutcome::RejectedWrong { expected };
    }

    if session.taking_turns && session.last_contributor.as_deref() == Some(participant) {
        return SubmitOutcome::RejectedTurn;
    }

    if let Err(violation) = session.post_validate(value) {
        return SubmitOutcome::RejectedRule(violation);
    }

    session.commit(value, participant);
    SubmitOutcome::Accepted { value }
}

fn not_active(channel_id: &str) -> crate::error::Error {
    SessionError::NotActive {
        channel: channel_id.to_string(),
    }
    .into()
}

fn enabled_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Spawn a background task that periodically logs every active session.
pub fn spawn_status_task(engine: Arc<CountingEngine>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(engine.config.status_interval);
        loop {
            interval.tick().await;
            let registry = engine.registry.lock().await;
            for (guild, channel, session) in registry.iter() {
                debug!(
                    guild = %guild,
                    channel = %channel,
                    mode = %session.mode,
                    current = session.current_value,
                    "Counting status"
                );
            }
        }
    })
}
