//! `now_playing` and `trackInfo` queries

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::content_item::ContentItem;
use crate::error::{ApiError, Result};
use crate::operation::{attr, child_text, expect_root, DeviceQuery};

/// Source reported while the device is in standby
pub const STANDBY_SOURCE: &str = "STANDBY";

/// Playback status reported in `<playStatus>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayStatus {
    Play,
    Pause,
    Stop,
    Buffering,
    Invalid,
    Other(String),
}

impl PlayStatus {
    pub fn parse(text: &str) -> Self {
        match text {
            "PLAY_STATE" => PlayStatus::Play,
            "PAUSE_STATE" => PlayStatus::Pause,
            "STOP_STATE" => PlayStatus::Stop,
            "BUFFERING_STATE" => PlayStatus::Buffering,
            "INVALID_PLAY_STATUS" => PlayStatus::Invalid,
            other => PlayStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlayStatus::Play => "PLAY_STATE",
            PlayStatus::Pause => "PAUSE_STATE",
            PlayStatus::Stop => "STOP_STATE",
            PlayStatus::Buffering => "BUFFERING_STATE",
            PlayStatus::Invalid => "INVALID_PLAY_STATUS",
            PlayStatus::Other(other) => other,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlayStatus::Play)
    }
}

/// Current device state as reported by `now_playing`
///
/// Volatile; callers re-query instead of caching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub source: String,
    pub source_account: Option<String>,
    pub content_item: ContentItem,
    /// `None` while in standby, where the device omits `<playStatus>`
    pub play_status: Option<PlayStatus>,
    pub item_name: Option<String>,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub station_name: Option<String>,
    pub art: Option<String>,
}

impl NowPlaying {
    /// Parse a `<nowPlaying>` element
    pub fn from_element(xml: &Element) -> Result<Self> {
        expect_root(xml, "nowPlaying")?;
        let source = attr(xml, "source").ok_or_else(|| ApiError::missing("nowPlaying", "source"))?;
        let source_account = attr(xml, "sourceAccount");

        let (content_item, item_name) = match xml.get_child("ContentItem") {
            Some(item) => (ContentItem::from_element(item)?, ContentItem::item_name(item)),
            None => (
                ContentItem {
                    source: source.clone(),
                    item_type: None,
                    location: None,
                    source_account: source_account.clone(),
                },
                None,
            ),
        };

        Ok(Self {
            source,
            source_account,
            content_item,
            play_status: child_text(xml, "playStatus").map(|s| PlayStatus::parse(&s)),
            item_name,
            track: child_text(xml, "track"),
            artist: child_text(xml, "artist"),
            album: child_text(xml, "album"),
            station_name: child_text(xml, "stationName"),
            art: child_text(xml, "art"),
        })
    }

    /// Standby state, used when synthesizing updates
    pub fn standby() -> Self {
        Self {
            source: STANDBY_SOURCE.to_string(),
            source_account: None,
            content_item: ContentItem::new(STANDBY_SOURCE),
            play_status: None,
            item_name: None,
            track: None,
            artist: None,
            album: None,
            station_name: None,
            art: None,
        }
    }

    pub fn is_standby(&self) -> bool {
        self.source == STANDBY_SOURCE
    }

    pub fn is_playing(&self) -> bool {
        self.play_status.as_ref().map_or(false, PlayStatus::is_playing)
    }
}

/// GET `now_playing`
pub struct NowPlayingQuery;

impl DeviceQuery for NowPlayingQuery {
    type Response = NowPlaying;

    const ACTION: &'static str = "now_playing";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        NowPlaying::from_element(xml)
    }
}

/// GET `trackInfo`, same document shape as `now_playing`
pub struct TrackInfoQuery;

impl DeviceQuery for TrackInfoQuery {
    type Response = NowPlaying;

    const ACTION: &'static str = "trackInfo";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        NowPlaying::from_element(xml)
    }
}
