//! Host-facing accessory for one device
//!
//! Creates the power switch, the volume entity and one switch per selector,
//! and routes host reads and writes to the [`PowerVolumeController`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use soundtouch_api::NowPlaying;
use soundtouch_state::{preset_tag, source_tag, SelectorIdentity, SelectorSyncPolicy};
use soundtouch_stream::{EventStream, PollingConfig, PollingTask, UpdateDispatcher};
use tracing::debug;

use crate::controller::{PowerVolumeController, StatusSink};
use crate::device::SoundTouchDevice;
use crate::error::{Result, SdkError};
use crate::host::{EntityHost, EntityKind, HostEntity, SelectorToggles, VolumePresentation, POWER_TAG};

/// Static details shown by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInformation {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: Option<String>,
}

/// Pushes controller and stream updates to the power and volume entities
///
/// A device in standby reads as muted.
struct EntityStatus {
    power: Arc<dyn HostEntity>,
    volume: VolumePresentation,
    powered: AtomicBool,
}

impl StatusSink for EntityStatus {
    fn power_changed(&self, on: bool) {
        self.powered.store(on, Ordering::Relaxed);
        self.power.update_on(on);
        self.volume.publish_power(on);
    }

    fn volume_changed(&self, volume: u8) {
        self.volume.publish_level(volume);
    }

    fn mute_changed(&self, muted: bool) {
        self.volume
            .publish_muted(muted || !self.powered.load(Ordering::Relaxed));
    }
}

pub struct SoundTouchAccessory {
    device: Arc<SoundTouchDevice>,
    controller: PowerVolumeController,
    sync: Arc<SelectorSyncPolicy>,
    status: Arc<EntityStatus>,
    selectors: HashMap<String, SelectorIdentity>,
}

impl std::fmt::Debug for SoundTouchAccessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundTouchAccessory")
            .field("name", &self.device.name())
            .field("volume", &self.status.volume)
            .field("selectors", &self.selectors.len())
            .finish_non_exhaustive()
    }
}

impl SoundTouchAccessory {
    /// Create or reuse the host entities for `device`
    ///
    /// Switches for presets the device lacks and sources turned off in the
    /// configuration are removed from the host.
    pub fn new(device: SoundTouchDevice, host: &dyn EntityHost) -> Result<Self> {
        let device = Arc::new(device);
        let name = device.name().to_string();

        let power = host.get_or_create_entity(EntityKind::Switch, &name, POWER_TAG);
        let settings = device.volume_settings();
        let volume = VolumePresentation::create(host, settings.mode, &name, settings.max_value);

        let registry = device.registry()?;
        let mut toggles = SelectorToggles::new();
        let mut selectors = HashMap::new();
        for entry in registry.entries() {
            toggles.insert(
                entry.tag.clone(),
                host.get_or_create_entity(EntityKind::Switch, &entry.name, &entry.tag),
            );
            selectors.insert(entry.tag.clone(), entry.identity.clone());
        }
        for index in 1..=6 {
            if !registry.contains(&SelectorIdentity::Preset(index)) {
                host.remove_entity(EntityKind::Switch, &preset_tag(index));
            }
        }
        for source in device.sources().iter().filter(|source| !source.enabled) {
            host.remove_entity(
                EntityKind::Switch,
                &source_tag(&source.source, source.account.as_deref()),
            );
        }
        debug!(device = %name, selectors = selectors.len(), "Accessory entities ready");

        let sync = Arc::new(SelectorSyncPolicy::new(registry, Arc::new(toggles)));
        let status = Arc::new(EntityStatus {
            power,
            volume,
            powered: AtomicBool::new(false),
        });
        let controller =
            PowerVolumeController::new(device.clone(), sync.clone(), status.clone());

        Ok(Self { device, controller, sync, status, selectors })
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn device(&self) -> &Arc<SoundTouchDevice> {
        &self.device
    }

    pub fn controller(&self) -> &PowerVolumeController {
        &self.controller
    }

    pub fn sync(&self) -> &Arc<SelectorSyncPolicy> {
        &self.sync
    }

    pub fn information(&self) -> AccessoryInformation {
        AccessoryInformation {
            manufacturer: "Bose".to_string(),
            model: self.device.model().unwrap_or("SoundTouch").to_string(),
            serial_number: self.device.id().to_string(),
            firmware_revision: self.device.firmware().map(str::to_string),
        }
    }

    /// Tags of the selector switches, presets first
    pub fn selector_tags(&self) -> Vec<String> {
        self.sync.entries().into_iter().map(|entry| entry.tag).collect()
    }

    pub async fn get_power(&self) -> Result<bool> {
        self.controller.is_on().await
    }

    pub async fn set_power(&self, on: bool) -> Result<bool> {
        self.controller.set_power(on).await
    }

    pub async fn get_volume(&self) -> Result<u8> {
        self.controller.get_volume().await
    }

    pub async fn set_volume(&self, volume: u8) -> Result<bool> {
        self.controller.set_volume(volume, true).await
    }

    /// Value of the volume entity's toggle: lit when playing unmuted for a
    /// lightbulb, the mute flag for a speaker
    pub async fn get_volume_toggle(&self) -> Result<bool> {
        let on = self.controller.is_on().await?;
        let muted = if on { self.controller.get_mute().await? } else { true };
        Ok(self.status.volume.host_value(on, muted))
    }

    pub async fn set_volume_toggle(&self, value: bool) -> Result<bool> {
        self.controller
            .set_mute(self.status.volume.muted_from_host(value))
            .await
    }

    pub async fn get_selector(&self, tag: &str) -> Result<bool> {
        let identity = self.identity(tag)?;
        self.controller.is_selected(identity).await
    }

    pub async fn set_selector(&self, tag: &str, on: bool) -> Result<bool> {
        let identity = self.identity(tag)?;
        self.controller.set_selector(identity, on).await
    }

    fn identity(&self, tag: &str) -> Result<&SelectorIdentity> {
        self.selectors
            .get(tag)
            .ok_or_else(|| SdkError::UnknownEntity(tag.to_string()))
    }

    /// Query the device and publish its state to every entity
    pub async fn refresh(&self) -> Result<NowPlaying> {
        self.controller.refresh().await
    }

    /// Drive the entities from pushed updates
    pub fn attach_event_stream(&self, stream: &EventStream) {
        self.wire(&stream.dispatcher());
    }

    /// Drive the entities by polling the device
    pub fn start_polling(&self, config: PollingConfig) -> PollingTask {
        let dispatcher = Arc::new(UpdateDispatcher::new());
        self.wire(&dispatcher);
        PollingTask::start(self.device.client().clone(), dispatcher, config)
    }

    fn wire(&self, dispatcher: &UpdateDispatcher) {
        let device = self.device.clone();
        let sync = self.sync.clone();
        dispatcher.set_now_playing_listener(move |now_playing| {
            sync.reconcile(&device.resolve(now_playing));
        });

        let status = self.status.clone();
        let sync = self.sync.clone();
        let name = self.device.name().to_string();
        dispatcher.set_powered_listener(move |on, _| {
            debug!(device = %name, on, "Power changed on device");
            status.power_changed(on);
            if !on {
                sync.power_off();
            }
        });

        let status = self.status.clone();
        dispatcher.set_volume_listener(move |level, volume| {
            status.volume_changed(level);
            status.mute_changed(volume.is_muted);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use soundtouch_api::testing::FakeDevice;
    use soundtouch_api::{ContentItem, DeviceEndpoint, SoundTouchClient};
    use soundtouch_stream::DeviceUpdate;

    use crate::config::{AccessoryConfig, GlobalConfig, SourceConfig, VolumeConfig, VolumeMode};
    use crate::host::recording::{EntityEvent, RecordingHost};
    use crate::host::VOLUME_TAG;

    async fn accessory(
        fake: &Arc<FakeDevice>,
        accessory: AccessoryConfig,
    ) -> (SoundTouchAccessory, Arc<RecordingHost>) {
        let client = SoundTouchClient::with_transport(
            DeviceEndpoint::new("192.168.1.20").unwrap(),
            fake.clone(),
        );
        let device = SoundTouchDevice::from_client(client, &GlobalConfig::default(), &accessory)
            .await
            .unwrap();
        let host = Arc::new(RecordingHost::default());
        let accessory = SoundTouchAccessory::new(device, host.as_ref()).unwrap();
        (accessory, host)
    }

    fn radio() -> ContentItem {
        ContentItem::new("INTERNET_RADIO")
            .with_type("stationurl")
            .with_location("4712")
    }

    #[tokio::test]
    async fn test_entities_created_and_removed() {
        let fake = Arc::new(FakeDevice::new());
        let config = AccessoryConfig {
            sources: Some(vec![SourceConfig {
                source: "BLUETOOTH".to_string(),
                account: None,
                name: None,
                enabled: Some(false),
            }]),
            ..Default::default()
        };
        let (accessory, host) = accessory(&fake, config).await;

        assert_eq!(
            host.tags(EntityKind::Switch),
            vec![
                "auxAUXService",
                "onService",
                "preset1Service",
                "preset2Service",
                "preset3Service",
                "productTVService",
            ]
        );
        let removed = host.removed();
        for index in 4..=6 {
            assert!(removed.contains(&(EntityKind::Switch, preset_tag(index))));
        }
        assert!(removed.contains(&(EntityKind::Switch, "bluetoothService".to_string())));
        assert!(removed.contains(&(EntityKind::Speaker, VOLUME_TAG.to_string())));

        assert_eq!(host.switch("preset1Service").name, "Radio Paradise");
        assert_eq!(host.switch("auxAUXService").name, "Kitchen AUX IN");
        assert_eq!(accessory.selector_tags().len(), 5);
    }

    #[tokio::test]
    async fn test_information() {
        let fake = Arc::new(FakeDevice::new());
        let (accessory, _) = accessory(&fake, AccessoryConfig::default()).await;
        assert_eq!(
            accessory.information(),
            AccessoryInformation {
                manufacturer: "Bose".to_string(),
                model: "SoundTouch 10".to_string(),
                serial_number: "689E19B8BB8A".to_string(),
                firmware_revision: Some("27.0.6.46330.5043500".to_string()),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_selector_switches_stay_exclusive() {
        let fake = Arc::new(FakeDevice::new().playing(radio()));
        let (accessory, host) = accessory(&fake, AccessoryConfig::default()).await;
        accessory.refresh().await.unwrap();
        assert_eq!(host.switch("preset1Service").is_on(), Some(true));
        assert_eq!(host.switch("preset2Service").is_on(), Some(false));

        assert!(accessory.set_selector("productTVService", true).await.unwrap());
        assert!(accessory.get_selector("productTVService").await.unwrap());
        assert_eq!(host.switch("productTVService").is_on(), Some(true));
        assert_eq!(host.switch("preset1Service").is_on(), Some(false));

        assert!(matches!(
            accessory.set_selector("preset9Service", true).await,
            Err(SdkError::UnknownEntity(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_off_playing_selector_powers_off() {
        let fake = Arc::new(FakeDevice::new().playing(radio()));
        let (accessory, host) = accessory(&fake, AccessoryConfig::default()).await;
        accessory.refresh().await.unwrap();

        assert!(accessory.set_selector("preset1Service", false).await.unwrap());
        assert!(!fake.is_powered());
        assert_eq!(host.switch(POWER_TAG).is_on(), Some(false));
        assert_eq!(host.switch("preset1Service").is_on(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lightbulb_toggle_maps_to_mute() {
        let fake = Arc::new(FakeDevice::new().playing(radio()));
        let (accessory, host) = accessory(&fake, AccessoryConfig::default()).await;
        let light = host.entity(EntityKind::Lightbulb, VOLUME_TAG).unwrap();

        assert!(accessory.get_volume_toggle().await.unwrap());
        // Switching the light off mutes
        assert!(accessory.set_volume_toggle(false).await.unwrap());
        assert!(fake.is_muted());
        assert!(!accessory.get_volume_toggle().await.unwrap());
        assert_eq!(light.is_on(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_speaker_mode() {
        let fake = Arc::new(FakeDevice::new().playing(radio()));
        let config = AccessoryConfig {
            volume: Some(VolumeConfig { mode: Some(VolumeMode::Speaker), ..Default::default() }),
            ..Default::default()
        };
        let (accessory, host) = accessory(&fake, config).await;
        assert!(host.entity(EntityKind::Lightbulb, VOLUME_TAG).is_none());
        let speaker = host.entity(EntityKind::Speaker, VOLUME_TAG).unwrap();

        assert!(accessory.set_volume_toggle(true).await.unwrap());
        assert!(fake.is_muted());
        assert!(speaker.events().contains(&EntityEvent::Mute(true)));

        assert!(accessory.set_volume(45).await.unwrap());
        assert_eq!(accessory.get_volume().await.unwrap(), 45);
        assert!(speaker.events().contains(&EntityEvent::Level(45)));
    }

    #[tokio::test]
    async fn test_dispatched_updates_drive_entities() {
        let fake = Arc::new(FakeDevice::new());
        let (accessory, host) = accessory(&fake, AccessoryConfig::default()).await;
        let dispatcher = UpdateDispatcher::new();
        accessory.wire(&dispatcher);

        let mut playing = NowPlaying::standby();
        playing.source = "AUX".to_string();
        playing.source_account = Some("AUX".to_string());
        playing.content_item = ContentItem::new("AUX").with_account("AUX");
        dispatcher.dispatch(DeviceUpdate::NowPlaying(playing));

        assert_eq!(host.switch(POWER_TAG).is_on(), Some(true));
        assert_eq!(host.switch("auxAUXService").is_on(), Some(true));
        assert_eq!(accessory.sync().active(), SelectorIdentity::source("AUX", Some("AUX")));

        dispatcher.dispatch(DeviceUpdate::NowPlaying(NowPlaying::standby()));
        assert_eq!(host.switch(POWER_TAG).is_on(), Some(false));
        assert_eq!(host.switch("auxAUXService").is_on(), Some(false));
        let light = host.entity(EntityKind::Lightbulb, VOLUME_TAG).unwrap();
        assert_eq!(light.is_on(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_drives_entities() {
        let fake = Arc::new(FakeDevice::new().playing(radio()).with_volume(25));
        let (accessory, host) = accessory(&fake, AccessoryConfig::default()).await;

        let task = accessory.start_polling(PollingConfig::default());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(host.switch("preset1Service").is_on(), Some(true));
        let light = host.entity(EntityKind::Lightbulb, VOLUME_TAG).unwrap();
        assert!(light.events().contains(&EntityEvent::Level(25)));

        fake.set_standby();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(host.switch(POWER_TAG).is_on(), Some(false));
        assert_eq!(host.switch("preset1Service").is_on(), Some(false));
        task.shutdown().await;
    }
}
