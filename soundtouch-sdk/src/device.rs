//! One configured speaker and its selectable catalog
//!
//! The catalog (info, presets, local sources) is queried when the device is
//! built and filtered through the accessory configuration. Which selectors
//! exist is fixed from then on, but the content stored in each preset slot is
//! re-read whenever the current selection is resolved from the device.

use parking_lot::RwLock;
use soundtouch_api::{
    CommandQueue, DeviceEndpoint, NowPlaying, Preset, SoundTouchClient, SourceItem,
};
use soundtouch_state::{resolve, SelectorIdentity, SelectorRegistry, SourceEntry};
use tracing::{debug, info};

use crate::config::{AccessoryConfig, GlobalConfig, VolumeSettings};
use crate::error::{Result, SdkError};

/// Handle to one speaker
///
/// Reads go straight to the client; writes go through the serial queue.
#[derive(Debug)]
pub struct SoundTouchDevice {
    client: SoundTouchClient,
    queue: CommandQueue,
    name: String,
    id: String,
    model: Option<String>,
    firmware: Option<String>,
    volume: VolumeSettings,
    /// Enabled presets, named from config or the device
    presets: Vec<Preset>,
    /// Every preset stored on the device, as last read
    device_presets: RwLock<Vec<Preset>>,
    /// Local sources, including disabled ones
    sources: Vec<SourceEntry>,
    verbose: bool,
}

impl SoundTouchDevice {
    /// Connect to the device named by `accessory.ip` and `accessory.port`
    ///
    /// Locating a device by `room` needs discovery, which is not supported.
    pub async fn from_config(global: &GlobalConfig, accessory: &AccessoryConfig) -> Result<Self> {
        let host = match (&accessory.ip, &accessory.room) {
            (Some(ip), _) => ip.clone(),
            (None, Some(room)) => {
                return Err(SdkError::DeviceNotFound(format!(
                    "room '{}' has no 'ip' and discovery is not supported",
                    room
                )))
            }
            (None, None) => {
                return Err(SdkError::InvalidConfig(
                    "accessory needs an 'ip'".to_string(),
                ))
            }
        };

        let mut endpoint = DeviceEndpoint::new(host)?;
        if let Some(port) = accessory.port {
            endpoint = endpoint.with_command_port(port);
        }
        Self::from_client(SoundTouchClient::new(endpoint), global, accessory).await
    }

    /// Query the catalog through `client` and apply the configuration
    pub async fn from_client(
        client: SoundTouchClient,
        global: &GlobalConfig,
        accessory: &AccessoryConfig,
    ) -> Result<Self> {
        let info = client.get_info().await?;
        let name = accessory.name.clone().unwrap_or_else(|| info.name.clone());

        let device_presets = client.get_presets().await?;
        let presets = available_presets(&device_presets, global, accessory);

        let sources = available_sources(&client.get_sources().await?, &name, global, accessory);

        info!(
            device = %name,
            id = %info.device_id,
            presets = presets.len(),
            sources = sources.len(),
            "Device catalog loaded"
        );

        Ok(Self {
            queue: CommandQueue::spawn(client.clone()),
            client,
            id: info.device_id.clone(),
            model: info.device_type.clone(),
            firmware: info.firmware_version().map(str::to_string),
            name,
            volume: VolumeSettings::resolve(global, accessory),
            presets,
            device_presets: RwLock::new(device_presets),
            sources,
            verbose: accessory.is_verbose(global),
        })
    }

    pub fn client(&self) -> &SoundTouchClient {
        &self.client
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn firmware(&self) -> Option<&str> {
        self.firmware.as_deref()
    }

    pub fn volume_settings(&self) -> VolumeSettings {
        self.volume
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Selector identity for an observed now-playing state
    ///
    /// Matches against the preset contents as last read from the device.
    pub fn resolve(&self, now_playing: &NowPlaying) -> SelectorIdentity {
        resolve(now_playing, &self.device_presets.read(), &self.sources)
    }

    /// Re-read the content stored in each preset slot
    pub async fn reload_presets(&self) -> Result<()> {
        let presets = self.client.get_presets().await?;
        debug!(device = %self.name, presets = presets.len(), "Preset contents reloaded");
        *self.device_presets.write() = presets;
        Ok(())
    }

    /// Selector identity of what the device is playing right now
    pub async fn current_selection(&self) -> Result<SelectorIdentity> {
        let now_playing = self.client.get_now_playing().await?;
        self.resolve_fresh(&now_playing).await
    }

    /// Resolve `now_playing` after re-reading the preset contents
    pub async fn resolve_fresh(&self, now_playing: &NowPlaying) -> Result<SelectorIdentity> {
        self.reload_presets().await?;
        let identity = self.resolve(now_playing);
        debug!(device = %self.name, selector = %identity, "Resolved current selection");
        Ok(identity)
    }

    /// Fresh registry with one selector per enabled preset and source
    pub fn registry(&self) -> Result<SelectorRegistry> {
        Ok(SelectorRegistry::from_catalog(&self.presets, &self.sources)?)
    }
}

fn available_presets(
    device_presets: &[Preset],
    global: &GlobalConfig,
    accessory: &AccessoryConfig,
) -> Vec<Preset> {
    device_presets
        .iter()
        .filter_map(|preset| {
            let config = accessory.preset(global, preset.id);
            if config.and_then(|c| c.enabled) == Some(false) {
                return None;
            }
            let name = config
                .and_then(|c| c.name.clone())
                .or_else(|| preset.name.clone());
            Some(Preset { name, ..preset.clone() })
        })
        .collect()
}

fn available_sources(
    items: &[SourceItem],
    device_name: &str,
    global: &GlobalConfig,
    accessory: &AccessoryConfig,
) -> Vec<SourceEntry> {
    items
        .iter()
        .filter(|item| item.is_local)
        .map(|item| {
            let config = accessory.source(global, &item.source, item.source_account.as_deref());
            let name = config.and_then(|c| c.name.clone()).unwrap_or_else(|| {
                let label = item
                    .label
                    .clone()
                    .unwrap_or_else(|| upper_case_first(&item.source));
                format!("{} {}", device_name, label)
            });
            SourceEntry {
                source: item.source.clone(),
                account: item.source_account.clone(),
                name,
                enabled: config.and_then(|c| c.enabled).unwrap_or(true),
            }
        })
        .collect()
}

/// `BLUETOOTH` -> `Bluetooth`
fn upper_case_first(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
