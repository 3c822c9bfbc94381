//! Platform configuration
//!
//! Mirrors the JSON the home automation host hands to the platform. Every
//! accessory setting can also be given once under `global`; lookups try the
//! accessory first for presets and sources, and `global` first for volume.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Volume used after power-on when nothing is configured for unmuting
pub const DEFAULT_UNMUTE_VALUE: u8 = 35;

/// Upper bound accepted by the device
pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub discover_all_accessories: Option<bool>,
    #[serde(default)]
    pub accessories: Vec<AccessoryConfig>,
    #[serde(default)]
    pub global: GlobalConfig,
}

impl PlatformConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryConfig {
    pub name: Option<String>,
    pub room: Option<String>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub verbose: Option<bool>,
    pub volume: Option<VolumeConfig>,
    pub presets: Option<Vec<PresetConfig>>,
    pub sources: Option<Vec<SourceConfig>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub volume: Option<VolumeConfig>,
    pub presets: Option<Vec<PresetConfig>>,
    pub sources: Option<Vec<SourceConfig>>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeConfig {
    pub on_value: Option<u8>,
    pub max_value: Option<u8>,
    pub unmute_value: Option<u8>,
    pub mode: Option<VolumeMode>,
}

/// How volume is exposed to the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeMode {
    /// A dimmable light: on means not muted, brightness is the volume
    #[default]
    Lightbulb,
    /// A speaker entity with mute and volume
    Speaker,
    /// Volume is not exposed
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetConfig {
    pub index: u8,
    pub name: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub source: String,
    pub account: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
}

impl SourceConfig {
    /// A config without an account applies to every account of the source
    pub fn matches(&self, source: &str, account: Option<&str>) -> bool {
        self.source == source
            && match self.account.as_deref() {
                None => true,
                Some(configured) => Some(configured) == account,
            }
    }
}

/// Volume settings after merging accessory and global config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSettings {
    /// Applied after power-on, if set
    pub on_value: Option<u8>,
    pub max_value: u8,
    /// Floor used when a mute control jumps straight to the maximum
    pub unmute_value: u8,
    pub mode: VolumeMode,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self::resolve(&GlobalConfig::default(), &AccessoryConfig::default())
    }
}

impl VolumeSettings {
    pub fn resolve(global: &GlobalConfig, accessory: &AccessoryConfig) -> Self {
        let global = global.volume.as_ref();
        let local = accessory.volume.as_ref();
        let pick = |field: fn(&VolumeConfig) -> Option<u8>| {
            global.and_then(field).or_else(|| local.and_then(field))
        };

        let on_value = pick(|v| v.on_value).map(|v| v.min(MAX_VOLUME));
        let max_value = pick(|v| v.max_value).unwrap_or(MAX_VOLUME).min(MAX_VOLUME);
        let unmute_value = pick(|v| v.unmute_value)
            .or(on_value)
            .unwrap_or(DEFAULT_UNMUTE_VALUE)
            .min(max_value);
        let mode = global
            .and_then(|v| v.mode)
            .or_else(|| local.and_then(|v| v.mode))
            .unwrap_or_default();

        Self { on_value, max_value, unmute_value, mode }
    }
}

impl AccessoryConfig {
    /// Preset config for slot `index`, accessory entries first
    pub fn preset<'a>(&'a self, global: &'a GlobalConfig, index: u8) -> Option<&'a PresetConfig> {
        let find = |list: &'a Option<Vec<PresetConfig>>| {
            list.as_ref().and_then(|list| list.iter().find(|p| p.index == index))
        };
        find(&self.presets).or_else(|| find(&global.presets))
    }

    /// Source config for `(source, account)`, accessory entries first
    pub fn source<'a>(
        &'a self,
        global: &'a GlobalConfig,
        source: &str,
        account: Option<&str>,
    ) -> Option<&'a SourceConfig> {
        let find = |list: &'a Option<Vec<SourceConfig>>| {
            list.as_ref()
                .and_then(|list| list.iter().find(|s| s.matches(source, account)))
        };
        find(&self.sources).or_else(|| find(&global.sources))
    }

    pub fn is_verbose(&self, global: &GlobalConfig) -> bool {
        self.verbose.or(global.verbose).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    const CONFIG: &str = r#"{
        "platform": "SoundTouchPlatform",
        "name": "SoundTouch",
        "accessories": [
            {
                "name": "Kitchen Speaker",
                "ip": "192.168.1.20",
                "volume": { "maxValue": 60, "mode": "speaker" },
                "presets": [ { "index": 2, "name": "Morning", "enabled": true } ],
                "sources": [ { "source": "AUX", "enabled": false } ]
            },
            { "room": "Bedroom" }
        ],
        "global": {
            "volume": { "onValue": 25 },
            "presets": [
                { "index": 2, "name": "Ignored" },
                { "index": 5, "enabled": false }
            ],
            "sources": [ { "source": "PRODUCT", "account": "TV", "name": "Television" } ]
        }
    }"#;

    #[test]
    fn test_parse_platform_config() {
        let config = PlatformConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.name.as_deref(), Some("SoundTouch"));
        assert_eq!(config.accessories.len(), 2);
        assert_eq!(config.accessories[1].room.as_deref(), Some("Bedroom"));
        assert_eq!(
            config.accessories[0].volume.as_ref().and_then(|v| v.mode),
            Some(VolumeMode::Speaker)
        );
    }

    #[test]
    fn test_lookup_prefers_accessory() {
        let config = PlatformConfig::from_json_str(CONFIG).unwrap();
        let kitchen = &config.accessories[0];

        let preset = kitchen.preset(&config.global, 2).unwrap();
        assert_eq!(preset.name.as_deref(), Some("Morning"));
        assert_eq!(kitchen.preset(&config.global, 5).unwrap().enabled, Some(false));
        assert!(kitchen.preset(&config.global, 1).is_none());

        // AUX config has no account, so it covers every AUX account
        let aux = kitchen.source(&config.global, "AUX", Some("AUX")).unwrap();
        assert_eq!(aux.enabled, Some(false));
        let tv = kitchen.source(&config.global, "PRODUCT", Some("TV")).unwrap();
        assert_eq!(tv.name.as_deref(), Some("Television"));
        assert!(kitchen.source(&config.global, "PRODUCT", Some("HDMI_1")).is_none());
    }

    #[test]
    fn test_volume_settings_merge() {
        let config = PlatformConfig::from_json_str(CONFIG).unwrap();
        let settings = VolumeSettings::resolve(&config.global, &config.accessories[0]);
        assert_eq!(
            settings,
            VolumeSettings {
                on_value: Some(25),
                max_value: 60,
                unmute_value: 25,
                mode: VolumeMode::Speaker,
            }
        );
    }

    #[rstest]
    #[case(None, None, None, 100, 35)]
    #[case(Some(40), None, None, 100, 40)]
    #[case(None, Some(150), None, 100, 35)]
    #[case(Some(30), Some(20), Some(50), 20, 20)]
    fn test_volume_defaults(
        #[case] on_value: Option<u8>,
        #[case] max_value: Option<u8>,
        #[case] unmute_value: Option<u8>,
        #[case] expected_max: u8,
        #[case] expected_unmute: u8,
    ) {
        let accessory = AccessoryConfig {
            volume: Some(VolumeConfig { on_value, max_value, unmute_value, mode: None }),
            ..Default::default()
        };
        let settings = VolumeSettings::resolve(&GlobalConfig::default(), &accessory);
        assert_eq!(settings.max_value, expected_max);
        assert_eq!(settings.unmute_value, expected_unmute);
        assert_eq!(settings.mode, VolumeMode::Lightbulb);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = PlatformConfig::from_path(file.path()).unwrap();
        assert_eq!(config.accessories[0].ip.as_deref(), Some("192.168.1.20"));

        assert!(matches!(
            PlatformConfig::from_path(file.path().with_extension("missing")),
            Err(crate::SdkError::Io(_))
        ));
        assert!(matches!(
            PlatformConfig::from_json_str("{\"accessories\": 3}"),
            Err(crate::SdkError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_verbose_falls_back_to_global() {
        let global = GlobalConfig { verbose: Some(true), ..Default::default() };
        assert!(AccessoryConfig::default().is_verbose(&global));
        let quiet = AccessoryConfig { verbose: Some(false), ..Default::default() };
        assert!(!quiet.is_verbose(&global));
    }
}
