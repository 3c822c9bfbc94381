//! SoundTouch API operations organized by endpoint
//!
//! Each module holds the typed request/response for one endpoint (or a
//! closely related group) and its [`DeviceQuery`](crate::DeviceQuery) /
//! [`DeviceCommand`](crate::DeviceCommand) implementation.

pub mod bass;
pub mod info;
pub mod key;
pub mod name;
pub mod now_playing;
pub mod presets;
pub mod select;
pub mod sources;
pub mod volume;
pub mod zone;

pub use bass::{Bass, BassCapabilities, BassCapabilitiesQuery, BassQuery, SetBassCommand};
pub use info::{Component, Info, InfoQuery};
pub use key::{KeyCommand, KeyRequest, KeyState, KeyValue};
pub use name::SetNameCommand;
pub use now_playing::{NowPlaying, NowPlayingQuery, PlayStatus, TrackInfoQuery, STANDBY_SOURCE};
pub use presets::{Preset, PresetsQuery};
pub use select::SelectCommand;
pub use sources::{SourceItem, SourceStatus, SourcesQuery};
pub use volume::{SetVolumeCommand, Volume, VolumeQuery};
pub use zone::{AddZoneSlaveCommand, RemoveZoneSlaveCommand, SetZoneCommand, Zone, ZoneMember, ZoneQuery, ZoneRequest};
