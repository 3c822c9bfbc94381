//! `key` command

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::operation::DeviceCommand;

/// Every key the device accepts on the `key` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyValue {
    Play,
    Pause,
    Stop,
    PrevTrack,
    NextTrack,
    ThumbsUp,
    ThumbsDown,
    Bookmark,
    Power,
    Mute,
    VolumeUp,
    VolumeDown,
    #[serde(rename = "PRESET_1")]
    Preset1,
    #[serde(rename = "PRESET_2")]
    Preset2,
    #[serde(rename = "PRESET_3")]
    Preset3,
    #[serde(rename = "PRESET_4")]
    Preset4,
    #[serde(rename = "PRESET_5")]
    Preset5,
    #[serde(rename = "PRESET_6")]
    Preset6,
    AuxInput,
    ShuffleOff,
    ShuffleOn,
    RepeatOff,
    RepeatOne,
    RepeatAll,
    PlayPause,
    AddFavorite,
    RemoveFavorite,
}

impl KeyValue {
    pub const ALL: [KeyValue; 27] = [
        KeyValue::Play,
        KeyValue::Pause,
        KeyValue::Stop,
        KeyValue::PrevTrack,
        KeyValue::NextTrack,
        KeyValue::ThumbsUp,
        KeyValue::ThumbsDown,
        KeyValue::Bookmark,
        KeyValue::Power,
        KeyValue::Mute,
        KeyValue::VolumeUp,
        KeyValue::VolumeDown,
        KeyValue::Preset1,
        KeyValue::Preset2,
        KeyValue::Preset3,
        KeyValue::Preset4,
        KeyValue::Preset5,
        KeyValue::Preset6,
        KeyValue::AuxInput,
        KeyValue::ShuffleOff,
        KeyValue::ShuffleOn,
        KeyValue::RepeatOff,
        KeyValue::RepeatOne,
        KeyValue::RepeatAll,
        KeyValue::PlayPause,
        KeyValue::AddFavorite,
        KeyValue::RemoveFavorite,
    ];

    /// Key that recalls preset slot `index` (1..=6)
    pub fn preset(index: u8) -> Result<Self, ApiError> {
        match index {
            1 => Ok(KeyValue::Preset1),
            2 => Ok(KeyValue::Preset2),
            3 => Ok(KeyValue::Preset3),
            4 => Ok(KeyValue::Preset4),
            5 => Ok(KeyValue::Preset5),
            6 => Ok(KeyValue::Preset6),
            _ => Err(ApiError::InvalidParameter(format!(
                "Preset index must be 1..=6, got {}",
                index
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyValue::Play => "PLAY",
            KeyValue::Pause => "PAUSE",
            KeyValue::Stop => "STOP",
            KeyValue::PrevTrack => "PREV_TRACK",
            KeyValue::NextTrack => "NEXT_TRACK",
            KeyValue::ThumbsUp => "THUMBS_UP",
            KeyValue::ThumbsDown => "THUMBS_DOWN",
            KeyValue::Bookmark => "BOOKMARK",
            KeyValue::Power => "POWER",
            KeyValue::Mute => "MUTE",
            KeyValue::VolumeUp => "VOLUME_UP",
            KeyValue::VolumeDown => "VOLUME_DOWN",
            KeyValue::Preset1 => "PRESET_1",
            KeyValue::Preset2 => "PRESET_2",
            KeyValue::Preset3 => "PRESET_3",
            KeyValue::Preset4 => "PRESET_4",
            KeyValue::Preset5 => "PRESET_5",
            KeyValue::Preset6 => "PRESET_6",
            KeyValue::AuxInput => "AUX_INPUT",
            KeyValue::ShuffleOff => "SHUFFLE_OFF",
            KeyValue::ShuffleOn => "SHUFFLE_ON",
            KeyValue::RepeatOff => "REPEAT_OFF",
            KeyValue::RepeatOne => "REPEAT_ONE",
            KeyValue::RepeatAll => "REPEAT_ALL",
            KeyValue::PlayPause => "PLAY_PAUSE",
            KeyValue::AddFavorite => "ADD_FAVORITE",
            KeyValue::RemoveFavorite => "REMOVE_FAVORITE",
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyValue {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyValue::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ApiError::InvalidParameter(format!("Unknown key: {}", s)))
    }
}

/// Half of a key stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Press,
    Release,
}

impl KeyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyState::Press => "press",
            KeyState::Release => "release",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRequest {
    pub key: KeyValue,
    pub state: KeyState,
}

/// POST `key`; a full stroke is a press followed by a release
pub struct KeyCommand;

impl DeviceCommand for KeyCommand {
    type Request = KeyRequest;

    const ACTION: &'static str = "key";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            r#"<key state="{}" sender="Gabbo">{}</key>"#,
            request.state.as_str(),
            request.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_press_and_release_payloads() {
        let press = KeyRequest { key: KeyValue::Power, state: KeyState::Press };
        let release = KeyRequest { key: KeyValue::Power, state: KeyState::Release };
        assert_eq!(KeyCommand::build_payload(&press), r#"<key state="press" sender="Gabbo">POWER</key>"#);
        assert_eq!(KeyCommand::build_payload(&release), r#"<key state="release" sender="Gabbo">POWER</key>"#);
    }

    #[rstest]
    #[case(1, KeyValue::Preset1)]
    #[case(4, KeyValue::Preset4)]
    #[case(6, KeyValue::Preset6)]
    fn test_preset_key(#[case] index: u8, #[case] expected: KeyValue) {
        assert_eq!(KeyValue::preset(index).unwrap(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    fn test_preset_key_out_of_range(#[case] index: u8) {
        assert!(matches!(KeyValue::preset(index), Err(ApiError::InvalidParameter(_))));
    }

    #[test]
    fn test_key_names_parse_back() {
        for key in KeyValue::ALL {
            assert_eq!(key.as_str().parse::<KeyValue>().unwrap(), key);
        }
        assert!("VOLUME".parse::<KeyValue>().is_err());
    }
}
