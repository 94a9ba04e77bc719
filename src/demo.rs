//! Self-playing demo game
//!
//! A tiny snake on a grid, steered by a seeded autopilot. It exists so the
//! binary (and the web page) have something to mount; real titles live with
//! the host page.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::session::{FrameOutcome, Game};

/// Grid cells per side
pub const GRID_SIZE: i32 = 16;
/// Points per food eaten
pub const FOOD_POINTS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn step(self, (x, y): (i32, i32)) -> (i32, i32) {
        match self {
            Dir::Up => (x, y - 1),
            Dir::Down => (x, y + 1),
            Dir::Left => (x - 1, y),
            Dir::Right => (x + 1, y),
        }
    }
}

/// Seeded self-playing snake
#[derive(Debug, Clone)]
pub struct DemoSlither {
    seed: u64,
    rng: Pcg32,
    body: Vec<(i32, i32)>,
    dir: Dir,
    food: (i32, i32),
    /// Chance per step that the autopilot turns at random
    pub wander: f64,
}

impl DemoSlither {
    pub fn new(seed: u64) -> Self {
        let mut game = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            body: Vec::new(),
            dir: Dir::Right,
            food: (0, 0),
            wander: 0.15,
        };
        game.reset();
        game
    }

    /// Seed used from the next `reset`
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn length(&self) -> usize {
        self.body.len()
    }

    fn in_bounds((x, y): (i32, i32)) -> bool {
        (0..GRID_SIZE).contains(&x) && (0..GRID_SIZE).contains(&y)
    }

    fn place_food(&mut self) {
        if self.body.len() >= (GRID_SIZE * GRID_SIZE) as usize {
            return;
        }
        loop {
            let cell = (
                self.rng.random_range(0..GRID_SIZE),
                self.rng.random_range(0..GRID_SIZE),
            );
            if !self.body.contains(&cell) {
                self.food = cell;
                return;
            }
        }
    }

    /// Head toward the food, sometimes wandering off
    fn steer(&mut self) {
        let head = self.body[0];
        let toward = if self.food.0 != head.0 {
            if self.food.0 > head.0 { Dir::Right } else { Dir::Left }
        } else if self.food.1 > head.1 {
            Dir::Down
        } else {
            Dir::Up
        };

        self.dir = if self.rng.random_bool(self.wander) {
            match self.rng.random_range(0..4) {
                0 => Dir::Up,
                1 => Dir::Down,
                2 => Dir::Left,
                _ => Dir::Right,
            }
        } else {
            toward
        };
    }
}

impl Game for DemoSlither {
    fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        let mid = GRID_SIZE / 2;
        self.body = vec![(mid, mid), (mid - 1, mid), (mid - 2, mid)];
        self.dir = Dir::Right;
        self.place_food();
    }

    /// One grid step per accepted frame, whatever the elapsed time
    fn update(&mut self, _elapsed_ms: f64) -> FrameOutcome {
        self.steer();
        let next = self.dir.step(self.body[0]);
        if !Self::in_bounds(next) || self.body[..self.body.len() - 1].contains(&next) {
            return FrameOutcome::finished();
        }

        self.body.insert(0, next);
        if next == self.food {
            self.place_food();
            FrameOutcome::scored(FOOD_POINTS)
        } else {
            self.body.pop();
            FrameOutcome::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut DemoSlither, max_steps: usize) -> (u64, usize) {
        let mut score = 0;
        for step in 0..max_steps {
            let outcome = game.update(100.0);
            score += outcome.score_delta;
            if outcome.finished {
                return (score, step);
            }
        }
        (score, max_steps)
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = DemoSlither::new(7);
        let mut b = DemoSlither::new(7);
        assert_eq!(play(&mut a, 500), play(&mut b, 500));
    }

    #[test]
    fn test_reset_replays() {
        let mut game = DemoSlither::new(42);
        let first = play(&mut game, 500);
        game.reset();
        assert_eq!(game.length(), 3);
        assert_eq!(play(&mut game, 500), first);
    }

    #[test]
    fn test_always_wandering_eventually_dies() {
        let mut game = DemoSlither::new(1);
        game.wander = 1.0;
        let (_, steps) = play(&mut game, 10_000);
        assert!(steps < 10_000);
    }

    #[test]
    fn test_eating_grows() {
        let mut game = DemoSlither::new(3);
        game.wander = 0.0;
        game.food = (GRID_SIZE / 2 + 1, GRID_SIZE / 2);
        let outcome = game.update(16.0);
        assert_eq!(outcome, FrameOutcome::scored(FOOD_POINTS));
        assert_eq!(game.length(), 4);
    }
}
