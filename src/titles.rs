//! The games in the arcade
//!
//! Each title persists under its own storage key and picks its own frame
//! pacing: grid games step on a coarse interval, action games run every
//! refresh.

use serde::{Deserialize, Serialize};

/// A game in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameTitle {
    PixelSlither,
    MazeChaser,
    BlockStacker,
    SideScroller,
    StarShooter,
    PaddleBreaker,
}

impl GameTitle {
    pub const ALL: [GameTitle; 6] = [
        GameTitle::PixelSlither,
        GameTitle::MazeChaser,
        GameTitle::BlockStacker,
        GameTitle::SideScroller,
        GameTitle::StarShooter,
        GameTitle::PaddleBreaker,
    ];

    /// LocalStorage key for this title's stats blob
    pub fn storage_key(&self) -> &'static str {
        match self {
            GameTitle::PixelSlither => "pixelSlither",
            GameTitle::MazeChaser => "mazeChaser",
            GameTitle::BlockStacker => "blockStacker",
            GameTitle::SideScroller => "sideScroller",
            GameTitle::StarShooter => "starShooter",
            GameTitle::PaddleBreaker => "paddleBreaker",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameTitle::PixelSlither => "Pixel Slither",
            GameTitle::MazeChaser => "Maze Chaser",
            GameTitle::BlockStacker => "Block Stacker",
            GameTitle::SideScroller => "Side Scroller",
            GameTitle::StarShooter => "Star Shooter",
            GameTitle::PaddleBreaker => "Paddle Breaker",
        }
    }

    /// Default minimum ms between frame callbacks
    pub fn min_interval_ms(&self) -> f64 {
        match self {
            GameTitle::PixelSlither => 100.0,
            GameTitle::MazeChaser => 50.0,
            GameTitle::BlockStacker => 16.0,
            GameTitle::SideScroller => 16.0,
            GameTitle::StarShooter => 16.0,
            GameTitle::PaddleBreaker => 16.0,
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.storage_key() == key)
    }
}
