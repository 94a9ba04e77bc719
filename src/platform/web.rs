//! Browser backends (wasm32 only)
//!
//! - `requestAnimationFrame` tick source
//! - `localStorage` storage
//! - Mounting a session into the frame loop, with auto-pause on tab hide/blur
//!   that is detached again when the mount handle is dropped

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::{StorageError, TimingError};
use crate::lifecycle::LifecycleState;
use crate::persistence::Storage;
use crate::scheduler::TickSource;
use crate::session::{Game, GameSession};

/// Ticks from `window.requestAnimationFrame`
pub struct AnimationFrameSource {
    window: web_sys::Window,
    callback: Option<Closure<dyn FnMut(f64)>>,
}

impl AnimationFrameSource {
    /// Fails only when there is no window, i.e. no timing primitive at all
    pub fn new() -> Result<Self, TimingError> {
        let window = web_sys::window().ok_or(TimingError::Unavailable)?;
        Ok(Self {
            window,
            callback: None,
        })
    }

    /// Set the closure the browser calls on each requested frame
    pub fn bind(&mut self, callback: Closure<dyn FnMut(f64)>) {
        self.callback = Some(callback);
    }
}

impl TickSource for AnimationFrameSource {
    type Handle = i32;

    fn request_tick(&mut self) -> Result<i32, TimingError> {
        let callback = self
            .callback
            .as_ref()
            .ok_or_else(|| TimingError::Request("no frame callback bound".into()))?;
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| TimingError::Request(format!("{e:?}")))
    }

    fn cancel_tick(&mut self, handle: i32) {
        let _ = self.window.cancel_animation_frame(handle);
    }
}

/// `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn new() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Read(format!("{e:?}")))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }
}

/// Session type driven by the browser
pub type WebSession<G, S> = GameSession<G, AnimationFrameSource, S>;

type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// A session wired into the page
///
/// Owns the auto-pause listeners. Dropping the handle detaches them, saves
/// any pending stats and, once the last strong reference goes, cancels the
/// outstanding frame.
pub struct MountedSession<G, S>
where
    G: Game + 'static,
    S: Storage + 'static,
{
    session: Rc<RefCell<WebSession<G, S>>>,
    window: web_sys::Window,
    visibility: Option<(web_sys::Document, Listener)>,
    blur: Option<Listener>,
}

impl<G, S> MountedSession<G, S>
where
    G: Game + 'static,
    S: Storage + 'static,
{
    pub fn session(&self) -> &Rc<RefCell<WebSession<G, S>>> {
        &self.session
    }
}

impl<G, S> Drop for MountedSession<G, S>
where
    G: Game + 'static,
    S: Storage + 'static,
{
    fn drop(&mut self) {
        if let Some((document, listener)) = self.visibility.take() {
            let _ = document.remove_event_listener_with_callback(
                "visibilitychange",
                listener.as_ref().unchecked_ref(),
            );
        }
        if let Some(listener) = self.blur.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("blur", listener.as_ref().unchecked_ref());
        }
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.suspend();
        }
    }
}

/// Wire a session into the animation frame loop
///
/// The frame closure holds only a weak reference to the session. A round
/// the game ends inside a frame is saved from a zero-delay timeout, after
/// the frame callback has returned.
pub fn mount<G, S>(session: WebSession<G, S>) -> Result<MountedSession<G, S>, TimingError>
where
    G: Game + 'static,
    S: Storage + 'static,
{
    let window = web_sys::window().ok_or(TimingError::Unavailable)?;
    let session = Rc::new(RefCell::new(session));

    let weak = Rc::downgrade(&session);
    let timer_window = window.clone();
    let closure = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
        let Some(session) = weak.upgrade() else {
            return;
        };
        session.borrow_mut().on_frame(timestamp);
        if session.borrow().has_unsaved_stats() {
            schedule_flush(&timer_window, Rc::downgrade(&session));
        }
    });
    session.borrow_mut().tick_source_mut().bind(closure);

    let visibility = window
        .document()
        .and_then(|document| pause_on_hidden(&document, &session).map(|l| (document, l)));
    let blur = pause_on_blur(&window, &session);

    Ok(MountedSession {
        session,
        window,
        visibility,
        blur,
    })
}

fn schedule_flush<G, S>(window: &web_sys::Window, weak: Weak<RefCell<WebSession<G, S>>>)
where
    G: Game + 'static,
    S: Storage + 'static,
{
    let flush = Closure::once_into_js(move || {
        if let Some(session) = weak.upgrade() {
            session.borrow_mut().flush_pending();
        }
    });
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(flush.unchecked_ref(), 0) {
        log::warn!("Could not schedule stats save: {e:?}");
    }
}

/// Pause when the tab is hidden (tab switch, minimize)
fn pause_on_hidden<G, S>(document: &web_sys::Document, session: &Rc<RefCell<WebSession<G, S>>>) -> Option<Listener>
where
    G: Game + 'static,
    S: Storage + 'static,
{
    let weak = Rc::downgrade(session);
    let document_clone = document.clone();
    let listener = Listener::new(move |_event: web_sys::Event| {
        if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
            auto_pause(&weak, "tab hidden");
        }
    });
    document
        .add_event_listener_with_callback("visibilitychange", listener.as_ref().unchecked_ref())
        .ok()
        .map(|()| listener)
}

/// Pause when the window loses focus (click outside)
fn pause_on_blur<G, S>(window: &web_sys::Window, session: &Rc<RefCell<WebSession<G, S>>>) -> Option<Listener>
where
    G: Game + 'static,
    S: Storage + 'static,
{
    let weak = Rc::downgrade(session);
    let listener = Listener::new(move |_event: web_sys::Event| auto_pause(&weak, "window blur"));
    window
        .add_event_listener_with_callback("blur", listener.as_ref().unchecked_ref())
        .ok()
        .map(|()| listener)
}

fn auto_pause<G, S>(weak: &Weak<RefCell<WebSession<G, S>>>, reason: &str)
where
    G: Game + 'static,
    S: Storage + 'static,
{
    if let Some(session) = weak.upgrade() {
        let mut s = session.borrow_mut();
        if s.state() == LifecycleState::Running && s.pause().is_ok() {
            log::info!("Auto-paused ({reason})");
        }
    }
}
