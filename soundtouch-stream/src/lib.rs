//! # soundtouch-stream
//!
//! Device-initiated updates for SoundTouch speakers.
//!
//! The device pushes XML frames over a WebSocket (`ws://{host}:8080`,
//! subprotocol `gabbo`). [`EventStream`] owns that connection, parses each
//! frame into [`DeviceUpdate`]s and hands them to an [`UpdateDispatcher`],
//! which turns now-playing reports into edge-triggered powered and
//! is-playing notifications. When the event port is unreachable,
//! [`PollingTask`] feeds the same dispatcher from periodic queries.
//!
//! ```rust,no_run
//! use soundtouch_api::DeviceEndpoint;
//! use soundtouch_stream::EventStream;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = DeviceEndpoint::new("192.168.1.20")?;
//! let stream = EventStream::new(&endpoint);
//!
//! stream.dispatcher().set_powered_listener(|on, now_playing| {
//!     println!("power {} ({})", on, now_playing.source);
//! });
//! stream.start(|| println!("connected"), |e| eprintln!("stream error: {}", e));
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatcher;
mod error;
mod polling;
mod stream;
mod updates;

pub use config::{PollingConfig, StreamConfig};
pub use dispatcher::{
    ConnectionStateListener, EdgeListener, NowPlayingListener, NowSelectionListener,
    RecentsListener, UpdateDispatcher, VolumeListener,
};
pub use error::{Result, StreamError};
pub use polling::PollingTask;
pub use stream::{EventStream, StreamState};
pub use updates::{
    parse_frame, ConnectionState, DeviceUpdate, NowSelection, RecentItem, RecentsUpdate,
};
