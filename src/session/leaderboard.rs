//! Per-session tally of accepted counts.
//!
//! Entries keep the order in which participants first scored. Ranking sorts
//! by count, descending, and equal counts keep that first-scored order.
//! Persisted as a JSON object (`participant -> count`) written in entry order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<(String, u64)>,
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub participant_id: String,
    pub count: u64,
}

impl Leaderboard {
    /// Add one accepted count for `participant`, returning the new tally.
    pub fn record(&mut self, participant: &str) -> u64 {
        match self.entries.iter_mut().find(|(p, _)| p == participant) {
            Some((_, count)) => {
                *count += 1;
                *count
            }
            None => {
                self.entries.push((participant.to_string(), 1));
                1
            }
        }
    }

    pub fn get(&self, participant: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(p, _)| p == participant)
            .map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All participants, highest count first.
    pub fn ranked(&self) -> Vec<LeaderboardEntry> {
        let mut sorted: Vec<&(String, u64)> = self.entries.iter().collect();
        // stable: ties stay in first-scored order
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, (participant, count))| LeaderboardEntry {
                rank: i + 1,
                participant_id: participant.clone(),
                count: *count,
            })
            .collect()
    }

    /// The first `n` ranked rows.
    pub fn top(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

impl Serialize for Leaderboard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (participant, count) in &self.entries {
            map.serialize_entry(participant, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Leaderboard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LeaderboardVisitor;

        impl<'de> Visitor<'de> for LeaderboardVisitor {
            type Value = Leaderboard;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of participant ids to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut board = Leaderboard::default();
                while let Some((participant, count)) = access.next_entry::<String, u64>()? {
                    match board.entries.iter_mut().find(|(p, _)| *p == participant) {
                        Some((_, existing)) => *existing = count,
                        None => board.entries.push((participant, count)),
                    }
                }
                Ok(board)
            }
        }

        deserializer.deserialize_map(LeaderboardVisitor)
    }
}
