//! SoundTouch selector state
//!
//! Keeps the exposed preset and source toggles in line with what the device
//! is playing.
//!
//! # Architecture
//!
//! ```text
//! NowPlaying ──resolve──▶ SelectorIdentity ──reconcile──▶ SelectorRegistry ──▶ SelectorSink
//!                                   command result ──┘        (one active)      (host toggles)
//! ```
//!
//! ```rust
//! use std::sync::Arc;
//! use soundtouch_api::{ContentItem, NowPlaying, PlayStatus, Preset};
//! use soundtouch_state::{resolve, NullSink, SelectorIdentity, SelectorRegistry, SelectorSyncPolicy};
//!
//! let presets = vec![Preset {
//!     id: 1,
//!     content_item: ContentItem::new("INTERNET_RADIO").with_location("4712"),
//!     name: Some("Radio".to_string()),
//! }];
//! let registry = SelectorRegistry::from_catalog(&presets, &[]).unwrap();
//! let policy = SelectorSyncPolicy::new(registry, Arc::new(NullSink));
//!
//! let mut now_playing = NowPlaying::standby();
//! now_playing.source = "INTERNET_RADIO".to_string();
//! now_playing.content_item = presets[0].content_item.clone();
//! now_playing.play_status = Some(PlayStatus::Play);
//!
//! policy.reconcile(&resolve(&now_playing, &presets, &[]));
//! assert_eq!(policy.active(), SelectorIdentity::Preset(1));
//! ```

mod error;
pub mod logging;
mod registry;
mod resolver;
mod sync;

pub use error::{Result, StateError};
pub use registry::{preset_tag, source_tag, tag_for, SelectorEntry, SelectorRegistry};
pub use resolver::{resolve, SelectorIdentity, SourceEntry};
pub use sync::{CommandTicket, NullSink, SelectorSink, SelectorSyncPolicy};
