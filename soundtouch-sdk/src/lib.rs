//! # SoundTouch SDK - speaker control as home automation toggles
//!
//! Exposes each Bose SoundTouch speaker as a power switch, a volume entity
//! and one switch per preset or local source, with the selector switches
//! kept mutually exclusive:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use soundtouch_sdk::{EntityHost, PlatformConfig, SoundTouchPlatform};
//!
//! # fn host() -> Arc<dyn EntityHost> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), soundtouch_sdk::SdkError> {
//!     let config = PlatformConfig::from_path("config.json")?;
//!     soundtouch_sdk::init_logging(soundtouch_sdk::logging_mode(&config)).ok();
//!
//!     let mut platform = SoundTouchPlatform::from_config(&config, |_| host()).await?;
//!     platform.start().await;
//!
//!     if let Some(kitchen) = platform.accessory("Kitchen") {
//!         kitchen.set_power(true).await?;
//!         kitchen.set_selector("preset2Service", true).await?;
//!         kitchen.set_volume(100).await?; // from near silence this lands on the unmute value
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! soundtouch-sdk (accessories, controller, config)
//!     ↓
//! soundtouch-state (selector resolution and sync)
//!     ↓
//! soundtouch-stream (WebSocket events, polling fallback)
//!     ↓
//! soundtouch-api (HTTP+XML commands, serial write queue)
//! ```

pub use accessory::{AccessoryInformation, SoundTouchAccessory};
pub use config::{
    AccessoryConfig, GlobalConfig, PlatformConfig, PresetConfig, SourceConfig, VolumeConfig,
    VolumeMode, VolumeSettings, DEFAULT_UNMUTE_VALUE, MAX_VOLUME,
};
pub use controller::{NullStatus, PowerVolumeController, StatusSink, DEFAULT_SETTLE_DELAY};
pub use device::SoundTouchDevice;
pub use error::{Result, SdkError};
pub use host::{
    EntityHost, EntityKind, HostEntity, SelectorToggles, VolumePresentation, POWER_TAG, VOLUME_TAG,
};
pub use platform::{logging_mode, SoundTouchPlatform};

// Re-export commonly used types from the lower layers
pub use soundtouch_api::{ContentItem, DeviceEndpoint, KeyValue, NowPlaying, SoundTouchClient};
pub use soundtouch_state::logging::{init_logging, init_logging_from_env, LoggingMode};
pub use soundtouch_state::{SelectorIdentity, SelectorSyncPolicy};
pub use soundtouch_stream::{EventStream, PollingConfig, PollingTask, StreamState};

mod accessory;
mod config;
mod controller;
mod device;
mod error;
mod host;
mod platform;
