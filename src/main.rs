//! Arcade Core entry point
//!
//! Web: mounts the demo game into the animation frame loop with localStorage
//! persistence. Native: plays a few headless rounds on a simulated 60 Hz clock.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;

    use arcade_core::demo::DemoSlither;
    use arcade_core::platform::web::{AnimationFrameSource, LocalStorage, MountedSession, mount};
    use arcade_core::{EngineConfig, GameSession, GameTitle, PersistenceConfig, PersistenceGateway};

    thread_local! {
        static MOUNTED: RefCell<Option<MountedSession<DemoSlither, LocalStorage>>> =
            const { RefCell::new(None) };
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }
        log::info!("Arcade Core starting...");

        let title = GameTitle::PixelSlither;
        let source = match AnimationFrameSource::new() {
            Ok(source) => source,
            Err(e) => {
                log::error!("Cannot run games here: {e}");
                return;
            }
        };
        let storage = match LocalStorage::new() {
            Ok(storage) => storage,
            Err(e) => {
                log::error!("No localStorage, cannot mount: {e}");
                return;
            }
        };

        let seed = js_seed();
        let mounted = PersistenceGateway::init(PersistenceConfig::for_title(title), storage)
            .and_then(|gateway| {
                let config = EngineConfig::load(
                    gateway.storage(),
                    "arcadeCoreConfig",
                    EngineConfig::for_title(title),
                );
                GameSession::new(DemoSlither::new(seed), source, gateway, config)
            });
        let session = match mounted {
            Ok(session) => session,
            Err(e) => {
                log::error!("Invalid configuration: {e}");
                return;
            }
        };
        let mounted = match mount(session) {
            Ok(mounted) => mounted,
            Err(e) => {
                log::error!("Cannot mount: {e}");
                return;
            }
        };

        if mounted.session().borrow_mut().start().is_ok() {
            log::info!("{} running!", title.display_name());
        }
        MOUNTED.with(|cell| *cell.borrow_mut() = Some(mounted));
    }

    fn js_seed() -> u64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() as u64)
            .unwrap_or(12345)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arcade_core::demo::DemoSlither;
    use arcade_core::platform::{ManualTickSource, MemoryStorage};
    use arcade_core::{EngineConfig, GameSession, GameTitle, LifecycleState, PersistenceConfig, PersistenceGateway};

    env_logger::init();
    log::info!("Arcade Core (native) starting...");

    let title = GameTitle::PixelSlither;
    let session = PersistenceGateway::init(PersistenceConfig::for_title(title), MemoryStorage::new())
        .and_then(|gateway| {
            GameSession::new(DemoSlither::new(7), ManualTickSource::new(), gateway, EngineConfig::for_title(title))
        });
    let mut session = match session {
        Ok(session) => session,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            return;
        }
    };

    // Simulated 60 Hz display
    const REFRESH_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES_PER_ROUND: u32 = 100_000;
    let mut now = 0.0;
    for round in 1..=5u64 {
        session.game_mut().set_seed(7 + round);
        if session.start().is_err() {
            break;
        }
        let mut frames = 0;
        while session.state() == LifecycleState::Running {
            session.on_frame(now);
            now += REFRESH_MS;
            frames += 1;
            if frames >= MAX_FRAMES_PER_ROUND {
                log::warn!("Round {round} did not end on its own, finishing it");
                let _ = session.finish();
            }
        }
        log::info!("Round {round}: {} points", session.score());
        let _ = session.restart();
    }

    let stats = session.stats();
    println!(
        "{}: {} games, high score {}, total {}",
        title.display_name(),
        stats.total_games,
        stats.high_score,
        stats.total_score
    );
    for state in session.achievements() {
        println!(
            "  [{}] {:<16} {}/{}",
            if state.unlocked { "x" } else { " " },
            state.definition.name,
            state.current,
            state.definition.requirement
        );
    }
    println!("Unlocked: {}%", session.unlock_percentage());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
