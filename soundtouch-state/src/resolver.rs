//! Mapping now-playing reports onto logical selectors

use serde::{Deserialize, Serialize};
use soundtouch_api::{NowPlaying, Preset};
use std::fmt;

/// Which selector the device is currently on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorIdentity {
    /// A preset slot, 1 to 6
    Preset(u8),
    /// A local source such as `AUX` or `BLUETOOTH`
    Source { source: String, account: Option<String> },
    /// Standby, or content no selector represents
    None,
}

impl SelectorIdentity {
    pub fn source(source: impl Into<String>, account: Option<&str>) -> Self {
        SelectorIdentity::Source {
            source: source.into(),
            account: account.filter(|a| !a.is_empty()).map(str::to_string),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SelectorIdentity::None)
    }
}

impl fmt::Display for SelectorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorIdentity::Preset(index) => write!(f, "preset {}", index),
            SelectorIdentity::Source { source, account: Some(account) } => {
                write!(f, "source {} ({})", source, account)
            }
            SelectorIdentity::Source { source, account: None } => write!(f, "source {}", source),
            SelectorIdentity::None => write!(f, "none"),
        }
    }
}

/// A local source offered as a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    pub source: String,
    pub account: Option<String>,
    pub name: String,
    pub enabled: bool,
}

impl SourceEntry {
    pub fn identity(&self) -> SelectorIdentity {
        SelectorIdentity::Source {
            source: self.source.clone(),
            account: self.account.clone(),
        }
    }

    fn matches(&self, now_playing: &NowPlaying) -> bool {
        self.source == now_playing.source && self.account == now_playing.source_account
    }
}

/// Resolve the selector for a now-playing report
///
/// Standby is always [`SelectorIdentity::None`]. Presets are tried first,
/// in ascending slot order, by exact content item equality; then enabled
/// sources by source and account. Content matching neither is `None`.
pub fn resolve(now_playing: &NowPlaying, presets: &[Preset], sources: &[SourceEntry]) -> SelectorIdentity {
    if now_playing.is_standby() {
        return SelectorIdentity::None;
    }

    let mut by_slot: Vec<&Preset> = presets.iter().collect();
    by_slot.sort_by_key(|preset| preset.id);
    if let Some(preset) = by_slot
        .into_iter()
        .find(|preset| preset.content_item == now_playing.content_item)
    {
        return SelectorIdentity::Preset(preset.id);
    }

    sources
        .iter()
        .filter(|entry| entry.enabled)
        .find(|entry| entry.matches(now_playing))
        .map(SourceEntry::identity)
        .unwrap_or(SelectorIdentity::None)
}
