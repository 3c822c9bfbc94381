//! Listener slots and edge detection for device updates
//!
//! Each category has exactly one listener slot; setting a listener replaces
//! the previous one. Now-playing updates feed three slots:
//!
//! - the now-playing listener, invoked on every message
//! - the powered listener, invoked only when the source crosses the standby
//!   boundary
//! - the is-playing listener, invoked only when the play status crosses the
//!   playing boundary
//!
//! Nothing has been seen before the first message, so it always fires both
//! edge listeners.

use std::sync::Arc;

use parking_lot::Mutex;
use soundtouch_api::{NowPlaying, Volume};
use tracing::{debug, trace, warn};

use crate::updates::{parse_frame, ConnectionState, DeviceUpdate, NowSelection, RecentsUpdate};

pub type NowPlayingListener = Arc<dyn Fn(&NowPlaying) + Send + Sync>;
pub type EdgeListener = Arc<dyn Fn(bool, &NowPlaying) + Send + Sync>;
pub type VolumeListener = Arc<dyn Fn(u8, &Volume) + Send + Sync>;
pub type ConnectionStateListener = Arc<dyn Fn(&ConnectionState) + Send + Sync>;
pub type NowSelectionListener = Arc<dyn Fn(&NowSelection) + Send + Sync>;
pub type RecentsListener = Arc<dyn Fn(&RecentsUpdate) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    now_playing: Option<NowPlayingListener>,
    powered: Option<EdgeListener>,
    is_playing: Option<EdgeListener>,
    volume: Option<VolumeListener>,
    connection_state: Option<ConnectionStateListener>,
    now_selection: Option<NowSelectionListener>,
    recents: Option<RecentsListener>,
}

#[derive(Debug, Default)]
struct EdgeState {
    powered: Option<bool>,
    playing: Option<bool>,
    volume: Option<u8>,
}

/// Routes updates to listeners
///
/// Shared between the WebSocket reader and the polling fallback so both
/// sources go through the same edge detection.
#[derive(Default)]
pub struct UpdateDispatcher {
    listeners: Mutex<Listeners>,
    edges: Mutex<EdgeState>,
}

impl std::fmt::Debug for UpdateDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDispatcher")
            .field("edges", &*self.edges.lock())
            .finish_non_exhaustive()
    }
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now_playing_listener(&self, listener: impl Fn(&NowPlaying) + Send + Sync + 'static) {
        self.listeners.lock().now_playing = Some(Arc::new(listener));
    }

    pub fn set_powered_listener(&self, listener: impl Fn(bool, &NowPlaying) + Send + Sync + 'static) {
        self.listeners.lock().powered = Some(Arc::new(listener));
    }

    pub fn set_is_playing_listener(&self, listener: impl Fn(bool, &NowPlaying) + Send + Sync + 'static) {
        self.listeners.lock().is_playing = Some(Arc::new(listener));
    }

    pub fn set_volume_listener(&self, listener: impl Fn(u8, &Volume) + Send + Sync + 'static) {
        self.listeners.lock().volume = Some(Arc::new(listener));
    }

    pub fn set_connection_state_listener(
        &self,
        listener: impl Fn(&ConnectionState) + Send + Sync + 'static,
    ) {
        self.listeners.lock().connection_state = Some(Arc::new(listener));
    }

    pub fn set_now_selection_listener(&self, listener: impl Fn(&NowSelection) + Send + Sync + 'static) {
        self.listeners.lock().now_selection = Some(Arc::new(listener));
    }

    pub fn set_recents_listener(&self, listener: impl Fn(&RecentsUpdate) + Send + Sync + 'static) {
        self.listeners.lock().recents = Some(Arc::new(listener));
    }

    /// Remove every listener
    pub fn clear_listeners(&self) {
        *self.listeners.lock() = Listeners::default();
    }

    /// Forget the last seen values so the next message fires the edges again
    pub fn reset_edges(&self) {
        *self.edges.lock() = EdgeState::default();
    }

    /// Parse a text frame and dispatch its updates
    ///
    /// Malformed frames are logged and dropped.
    pub fn handle_frame(&self, text: &str) {
        match parse_frame(text) {
            Ok(updates) => {
                for update in updates {
                    self.dispatch(update);
                }
            }
            Err(e) => warn!(error = %e, "Dropping malformed update frame"),
        }
    }

    /// Dispatch one update to the listeners of its category
    pub fn dispatch(&self, update: DeviceUpdate) {
        trace!(kind = update.kind(), "Dispatching update");
        match update {
            DeviceUpdate::NowPlaying(now_playing) => self.dispatch_now_playing(&now_playing),
            DeviceUpdate::Volume(volume) => self.dispatch_volume(&volume),
            DeviceUpdate::ConnectionState(state) => {
                let listener = self.listeners.lock().connection_state.clone();
                if let Some(listener) = listener {
                    listener(&state);
                }
            }
            DeviceUpdate::NowSelection(selection) => {
                let listener = self.listeners.lock().now_selection.clone();
                if let Some(listener) = listener {
                    listener(&selection);
                }
            }
            DeviceUpdate::Recents(recents) => {
                let listener = self.listeners.lock().recents.clone();
                if let Some(listener) = listener {
                    listener(&recents);
                }
            }
            DeviceUpdate::Unrecognized(name) => {
                debug!(element = %name, "Ignoring unrecognized update");
            }
        }
    }

    fn dispatch_now_playing(&self, now_playing: &NowPlaying) {
        let powered = !now_playing.is_standby();
        let playing = now_playing.is_playing();

        // Edges are computed before any listener runs so a listener that
        // re-enters the dispatcher sees consistent state.
        let (powered_edge, playing_edge) = {
            let mut edges = self.edges.lock();
            let powered_edge = edges.powered != Some(powered);
            let playing_edge = edges.playing != Some(playing);
            edges.powered = Some(powered);
            edges.playing = Some(playing);
            (powered_edge, playing_edge)
        };

        let (general, powered_listener, playing_listener) = {
            let listeners = self.listeners.lock();
            (
                listeners.now_playing.clone(),
                listeners.powered.clone(),
                listeners.is_playing.clone(),
            )
        };

        if let Some(listener) = general {
            listener(now_playing);
        }
        if powered_edge {
            debug!(powered, source = %now_playing.source, "Power state changed");
            if let Some(listener) = powered_listener {
                listener(powered, now_playing);
            }
        }
        if playing_edge {
            debug!(playing, "Playback state changed");
            if let Some(listener) = playing_listener {
                listener(playing, now_playing);
            }
        }
    }

    fn dispatch_volume(&self, volume: &Volume) {
        let previous = self.edges.lock().volume.replace(volume.actual);
        trace!(volume = volume.actual, ?previous, "Volume reported");

        let listener = self.listeners.lock().volume.clone();
        if let Some(listener) = listener {
            listener(volume.actual, volume);
        }
    }
}
