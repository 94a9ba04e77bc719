//! Lifetime player statistics
//!
//! One [`PlayerStats`] blob per game title, persisted as JSON:
//!
//! ```json
//! { "highScore": 250, "achievements": ["score_50"], "leaderboard": [],
//!   "totalGames": 5, "totalScore": 600 }
//! ```
//!
//! Every field has a default, so blobs written by older builds with missing
//! fields still load. Wrongly-typed content fails the whole parse and the
//! gateway falls back to [`PlayerStats::default`].

use serde::{Deserialize, Deserializer, Serialize};

/// Default number of leaderboard entries kept
pub const DEFAULT_LEADERBOARD_CAPACITY: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub score: u64,
}

/// Leaderboard sorted by score, highest first
///
/// Position in the list is the rank. Equal scores keep the earlier entry ahead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the board invariants after loading untrusted content
    ///
    /// Entries end up highest first with equal scores in their stored order.
    /// Zero scores are dropped since they could never have been added.
    pub fn tidy(&mut self) {
        self.entries.retain(|e| e.score > 0);
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
    }

    /// 1-indexed place `score` would take on a board holding `capacity` entries
    pub fn potential_rank(&self, score: u64, capacity: usize) -> Option<usize> {
        if score == 0 {
            return None;
        }
        // Earlier entries win ties, so skip everything at or above `score`
        let rank = self.entries.partition_point(|e| e.score >= score) + 1;
        (rank <= capacity).then_some(rank)
    }

    pub fn qualifies(&self, score: u64, capacity: usize) -> bool {
        self.potential_rank(score, capacity).is_some()
    }

    /// Insert a score if it makes the board, returning its rank (1-indexed)
    ///
    /// A board longer than `capacity` is cut down first, so the returned rank
    /// is always within the kept entries.
    pub fn add(&mut self, player: &str, score: u64, capacity: usize) -> Option<usize> {
        self.entries.truncate(capacity);
        let rank = self.potential_rank(score, capacity)?;
        self.entries.insert(
            rank - 1,
            LeaderboardEntry {
                player: player.to_string(),
                score,
            },
        );
        self.entries.truncate(capacity);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    fn scores(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.score).collect()
    }
}

/// Lifetime statistics for one game title
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Best single-round score (default 0)
    #[serde(default)]
    pub high_score: u64,
    /// Completed rounds (default 0)
    #[serde(default)]
    pub total_games: u64,
    /// Sum of all round scores (default 0)
    #[serde(default)]
    pub total_score: u64,
    /// Default empty
    #[serde(default)]
    pub leaderboard: Leaderboard,
    /// Ids unlocked at last save. Advisory only: achievements are always
    /// recomputed from the numbers above.
    #[serde(default, deserialize_with = "lenient_achievement_ids")]
    pub achievements: Vec<String>,
}

/// What a finished round did to the stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub score: u64,
    pub new_high_score: bool,
    /// Leaderboard rank (1-indexed), if the score made the board
    pub rank: Option<usize>,
}

impl PlayerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed round into the lifetime stats
    ///
    /// Totals saturate rather than wrap, so stats never decrease.
    pub fn record_round(&mut self, player: &str, score: u64, capacity: usize) -> RoundSummary {
        self.total_games = self.total_games.saturating_add(1);
        self.total_score = self.total_score.saturating_add(score);

        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
        }

        let rank = self.leaderboard.add(player, score, capacity);

        RoundSummary {
            score,
            new_high_score,
            rank,
        }
    }

    /// Mean score per round (0 before the first round)
    pub fn average_score(&self) -> u64 {
        self.total_score.checked_div(self.total_games).unwrap_or(0)
    }
}

/// Accept both plain id strings and legacy `{ "id": ... }` objects
fn lenient_achievement_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(id) => Some(id),
            serde_json::Value::Object(map) => map
                .get("id")
                .and_then(|id| id.as_str())
                .map(str::to_string),
            _ => None,
        })
        .collect())
}
