//! Achievement evaluation
//!
//! Pure functions over lifetime [`PlayerStats`]. Nothing here is stored:
//! achievement state is recomputed on demand, so the catalog can change
//! between releases without migrating saved blobs.

use serde::{Deserialize, Serialize};

use crate::stats::PlayerStats;

/// Achievement grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gameplay,
    Score,
    Persistence,
    Special,
}

/// Lifetime stat an achievement is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    HighScore,
    TotalGames,
    TotalScore,
}

impl Metric {
    pub fn read(self, stats: &PlayerStats) -> u64 {
        match self {
            Metric::HighScore => stats.high_score,
            Metric::TotalGames => stats.total_games,
            Metric::TotalScore => stats.total_score,
        }
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: Category,
    pub metric: Metric,
    pub requirement: u64,
}

/// Derived progress towards one achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementState<'a> {
    pub definition: &'a AchievementDefinition,
    /// `min(stat, requirement)`
    pub current: u64,
    pub unlocked: bool,
}

impl AchievementState<'_> {
    /// Progress in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.definition.requirement == 0 {
            return 1.0;
        }
        self.current as f32 / self.definition.requirement as f32
    }
}

/// Default achievement catalog shared by every title
pub const DEFAULT_ACHIEVEMENTS: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: "score_50",
        name: "Warming Up",
        description: "Score 50 points in a single game",
        icon: "star",
        category: Category::Score,
        metric: Metric::HighScore,
        requirement: 50,
    },
    AchievementDefinition {
        id: "score_100",
        name: "Century",
        description: "Score 100 points in a single game",
        icon: "star-double",
        category: Category::Score,
        metric: Metric::HighScore,
        requirement: 100,
    },
    AchievementDefinition {
        id: "score_250",
        name: "High Roller",
        description: "Score 250 points in a single game",
        icon: "trophy",
        category: Category::Score,
        metric: Metric::HighScore,
        requirement: 250,
    },
    AchievementDefinition {
        id: "score_500",
        name: "Arcade Legend",
        description: "Score 500 points in a single game",
        icon: "crown",
        category: Category::Score,
        metric: Metric::HighScore,
        requirement: 500,
    },
    AchievementDefinition {
        id: "games_5",
        name: "Regular",
        description: "Play 5 games",
        icon: "joystick",
        category: Category::Gameplay,
        metric: Metric::TotalGames,
        requirement: 5,
    },
    AchievementDefinition {
        id: "games_25",
        name: "Dedicated",
        description: "Play 25 games",
        icon: "calendar",
        category: Category::Persistence,
        metric: Metric::TotalGames,
        requirement: 25,
    },
    AchievementDefinition {
        id: "total_1000",
        name: "Point Collector",
        description: "Score 1000 points across all games",
        icon: "coins",
        category: Category::Persistence,
        metric: Metric::TotalScore,
        requirement: 1000,
    },
    AchievementDefinition {
        id: "total_10000",
        name: "Hoarder",
        description: "Score 10000 points across all games",
        icon: "gem",
        category: Category::Special,
        metric: Metric::TotalScore,
        requirement: 10000,
    },
];

/// Evaluate one definition
pub fn evaluate_one<'a>(def: &'a AchievementDefinition, stats: &PlayerStats) -> AchievementState<'a> {
    let value = def.metric.read(stats);
    AchievementState {
        definition: def,
        current: value.min(def.requirement),
        unlocked: value >= def.requirement,
    }
}

/// Evaluate the whole catalog, in catalog order
pub fn evaluate<'a>(catalog: &'a [AchievementDefinition], stats: &PlayerStats) -> Vec<AchievementState<'a>> {
    catalog.iter().map(|def| evaluate_one(def, stats)).collect()
}

/// Definitions currently unlocked, in catalog order
pub fn unlocked<'a>(catalog: &'a [AchievementDefinition], stats: &PlayerStats) -> Vec<&'a AchievementDefinition> {
    catalog
        .iter()
        .filter(|def| evaluate_one(def, stats).unlocked)
        .collect()
}

/// `round(100 * unlocked / total)`, halves rounding up. 0 for an empty catalog.
pub fn unlock_percentage(catalog: &[AchievementDefinition], stats: &PlayerStats) -> u32 {
    let total = catalog.len() as u64;
    if total == 0 {
        return 0;
    }
    let count = unlocked(catalog, stats).len() as u64;
    ((200 * count + total) / (2 * total)) as u32
}

/// Achievements unlocked in `after` but not in `before`
pub fn newly_unlocked<'a>(
    catalog: &'a [AchievementDefinition],
    before: &PlayerStats,
    after: &PlayerStats,
) -> Vec<&'a AchievementDefinition> {
    catalog
        .iter()
        .filter(|def| !evaluate_one(def, before).unlocked && evaluate_one(def, after).unlocked)
        .collect()
}

/// Look up a definition by id
pub fn find<'a>(catalog: &'a [AchievementDefinition], id: &str) -> Option<&'a AchievementDefinition> {
    catalog.iter().find(|def| def.id == id)
}
