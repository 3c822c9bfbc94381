//! High-level SoundTouch API for device control
//!
//! This crate provides a type-safe, trait-based API for the SoundTouch HTTP+XML
//! command protocol. It uses the private `http-client` crate for transport and
//! XML parsing.
//!
//! Reads go straight through [`SoundTouchClient`]. Writes that change device
//! state should go through a [`CommandQueue`], which executes them one at a
//! time in the order received:
//!
//! ```rust,ignore
//! use soundtouch_api::{CommandQueue, DeviceEndpoint, KeyValue, SoundTouchClient};
//!
//! let client = SoundTouchClient::new(DeviceEndpoint::new("192.168.1.20")?);
//! let queue = CommandQueue::spawn(client.clone());
//!
//! let volume = client.get_volume().await?;
//! if volume.is_muted {
//!     queue.press_key(KeyValue::Mute).await?;
//! }
//! ```

pub mod client;
pub mod content_item;
pub mod endpoint;
pub mod error;
pub mod operation;
pub mod operations;
pub mod queue;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::SoundTouchClient;
pub use content_item::ContentItem;
pub use endpoint::{DeviceEndpoint, DEFAULT_COMMAND_PORT, DEFAULT_EVENT_PORT};
pub use error::{ApiError, Result};
pub use operation::{escape_xml, DeviceCommand, DeviceQuery};
pub use operations::{
    Bass, BassCapabilities, Component, Info, KeyValue, NowPlaying, PlayStatus, Preset,
    SourceItem, SourceStatus, Volume, Zone, ZoneMember, ZoneRequest, STANDBY_SOURCE,
};
pub use queue::{CommandQueue, QueuedCommand};

pub use http_client::{HttpClient, HttpResponse, Transport};
