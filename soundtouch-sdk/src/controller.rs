//! Power, volume and selection commands for one device
//!
//! Every method queries the device before acting, so a command never relies
//! on what an event stream may or may not have delivered yet.

use std::sync::Arc;
use std::time::Duration;

use soundtouch_api::{ContentItem, KeyValue, NowPlaying, QueuedCommand};
use soundtouch_state::{SelectorIdentity, SelectorSyncPolicy};
use tracing::{debug, info, warn};

use crate::device::SoundTouchDevice;
use crate::error::Result;

/// Wait after a power-on key before the device reports the new session
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Receives state the controller has just changed on the device
pub trait StatusSink: Send + Sync {
    fn power_changed(&self, _on: bool) {}

    fn volume_changed(&self, _volume: u8) {}

    fn mute_changed(&self, _muted: bool) {}
}

/// Status sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatus;

impl StatusSink for NullStatus {}

pub struct PowerVolumeController {
    device: Arc<SoundTouchDevice>,
    sync: Arc<SelectorSyncPolicy>,
    status: Arc<dyn StatusSink>,
    settle_delay: Duration,
}

impl std::fmt::Debug for PowerVolumeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerVolumeController")
            .field("device", &self.device.name())
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}

impl PowerVolumeController {
    pub fn new(
        device: Arc<SoundTouchDevice>,
        sync: Arc<SelectorSyncPolicy>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            device,
            sync,
            status,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn device(&self) -> &Arc<SoundTouchDevice> {
        &self.device
    }

    pub fn sync(&self) -> &Arc<SelectorSyncPolicy> {
        &self.sync
    }

    pub async fn is_on(&self) -> Result<bool> {
        Ok(!self.device.client().get_now_playing().await?.is_standby())
    }

    /// Turn the device on or off
    ///
    /// Returns false when the device is already in the requested state or
    /// rejected the power key. After power-on the settle delay passes before
    /// the selection is resolved and the on-volume applied.
    pub async fn set_power(&self, on: bool) -> Result<bool> {
        let name = self.device.name();
        if self.is_on().await? == on {
            debug!(device = %name, on, "Power already in requested state");
            return Ok(false);
        }

        if !self.device.queue().press_key(KeyValue::Power).await? {
            warn!(device = %name, on, "Power key rejected");
            return Ok(false);
        }

        if on {
            info!(device = %name, "Turned on");
            self.status.power_changed(true);
            tokio::time::sleep(self.settle_delay).await;

            let identity = self.device.current_selection().await?;
            self.sync.reconcile(&identity);
            if let Some(on_value) = self.device.volume_settings().on_value {
                if !self.set_volume(on_value, true).await? {
                    warn!(device = %name, volume = on_value, "On-volume rejected");
                    return Ok(false);
                }
            }
        } else {
            info!(device = %name, "Turned off");
            self.status.power_changed(false);
            self.sync.power_off();
        }
        Ok(true)
    }

    pub async fn get_volume(&self) -> Result<u8> {
        let volume = self.device.client().get_volume().await?;
        debug!(device = %self.device.name(), volume = volume.actual, "Current volume");
        Ok(volume.actual)
    }

    /// Set the volume
    ///
    /// With `clamp`, the value is capped at the configured maximum, and a
    /// jump to the maximum from at most half of it is replaced by the larger
    /// of the current volume and the unmute value.
    pub async fn set_volume(&self, value: u8, clamp: bool) -> Result<bool> {
        let target = if clamp { self.guarded_volume(value).await? } else { value };

        let applied = self.device.queue().set_volume(target).await?;
        if applied {
            info!(device = %self.device.name(), volume = target, "Volume changed");
            self.status.volume_changed(target);
        }
        Ok(applied)
    }

    async fn guarded_volume(&self, value: u8) -> Result<u8> {
        let settings = self.device.volume_settings();
        let max = settings.max_value;
        let target = value.min(max);
        if target != max {
            return Ok(target);
        }

        let current = self.get_volume().await?;
        if u16::from(current) * 2 > u16::from(max) {
            return Ok(target);
        }
        let guarded = current.max(settings.unmute_value).min(max);
        debug!(
            device = %self.device.name(),
            requested = value,
            current,
            volume = guarded,
            "Volume jump to maximum replaced"
        );
        Ok(guarded)
    }

    pub async fn get_mute(&self) -> Result<bool> {
        Ok(self.device.client().get_volume().await?.is_muted)
    }

    /// Mute or unmute
    ///
    /// Unmuting a device in standby turns it on instead; muting it does
    /// nothing.
    pub async fn set_mute(&self, muted: bool) -> Result<bool> {
        if !self.is_on().await? {
            if muted {
                return Ok(false);
            }
            return self.set_power(true).await;
        }

        if self.get_mute().await? == muted {
            return Ok(false);
        }
        let pressed = self.device.queue().press_key(KeyValue::Mute).await?;
        if pressed {
            info!(device = %self.device.name(), muted, "Mute changed");
            self.status.mute_changed(muted);
        }
        Ok(pressed)
    }

    /// Replay preset slot `index`, turning the device on first if needed
    pub async fn press_preset(&self, index: u8) -> Result<bool> {
        let key = KeyValue::preset(index)?;
        self.select(SelectorIdentity::Preset(index), QueuedCommand::PressKey(key))
            .await
    }

    /// Switch to a local source, turning the device on first if needed
    pub async fn select_source(&self, source: &str, account: Option<&str>) -> Result<bool> {
        let mut item = ContentItem::new(source);
        if let Some(account) = account.filter(|a| !a.is_empty()) {
            item = item.with_account(account);
        }
        self.select(SelectorIdentity::source(source, account), QueuedCommand::Select(item))
            .await
    }

    async fn select(&self, identity: SelectorIdentity, command: QueuedCommand) -> Result<bool> {
        if !self.is_on().await? && !self.set_power(true).await? {
            return Ok(false);
        }

        let previous = self.device.current_selection().await?;
        let ticket = self.sync.begin_command();
        let applied = self.device.queue().submit(command).await?;
        self.sync
            .apply_command_result(ticket, &previous, &identity, applied);

        if applied {
            info!(device = %self.device.name(), selector = %identity, "Selected");
        } else {
            warn!(device = %self.device.name(), selector = %identity, "Selection rejected");
        }
        Ok(applied)
    }

    /// Whether the device is playing `identity` right now
    pub async fn is_selected(&self, identity: &SelectorIdentity) -> Result<bool> {
        Ok(self.device.current_selection().await? == *identity)
    }

    /// Switch a selector on or off
    ///
    /// Switching off the selector that is playing turns the device off.
    pub async fn set_selector(&self, identity: &SelectorIdentity, on: bool) -> Result<bool> {
        match identity {
            _ if !on => {
                if self.is_selected(identity).await? {
                    self.set_power(false).await
                } else {
                    Ok(false)
                }
            }
            SelectorIdentity::Preset(index) => self.press_preset(*index).await,
            SelectorIdentity::Source { source, account } => {
                self.select_source(source, account.as_deref()).await
            }
            SelectorIdentity::None => self.set_power(false).await,
        }
    }

    /// Re-read the device and publish everything
    pub async fn refresh(&self) -> Result<NowPlaying> {
        let now_playing = self.device.client().get_now_playing().await?;
        self.sync.reconcile(&self.device.resolve_fresh(&now_playing).await?);
        self.status.power_changed(!now_playing.is_standby());

        let volume = self.device.client().get_volume().await?;
        self.status.volume_changed(volume.actual);
        self.status.mute_changed(volume.is_muted);
        Ok(now_playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rstest::rstest;
    use soundtouch_api::testing::FakeDevice;
    use soundtouch_api::{ApiError, DeviceEndpoint, SoundTouchClient};
    use soundtouch_state::NullSink;

    use crate::config::{AccessoryConfig, GlobalConfig, VolumeConfig};
    use crate::error::SdkError;

    #[derive(Debug, Clone, PartialEq)]
    enum Status {
        Power(bool),
        Volume(u8),
        Mute(bool),
    }

    #[derive(Default)]
    struct RecordingStatus {
        events: Mutex<Vec<Status>>,
    }

    impl RecordingStatus {
        fn take(&self) -> Vec<Status> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl StatusSink for RecordingStatus {
        fn power_changed(&self, on: bool) {
            self.events.lock().push(Status::Power(on));
        }

        fn volume_changed(&self, volume: u8) {
            self.events.lock().push(Status::Volume(volume));
        }

        fn mute_changed(&self, muted: bool) {
            self.events.lock().push(Status::Mute(muted));
        }
    }

    struct Harness {
        fake: Arc<FakeDevice>,
        controller: PowerVolumeController,
        status: Arc<RecordingStatus>,
    }

    async fn harness(fake: FakeDevice, volume: Option<VolumeConfig>) -> Harness {
        let fake = Arc::new(fake);
        let client = SoundTouchClient::with_transport(
            DeviceEndpoint::new("192.168.1.20").unwrap(),
            fake.clone(),
        );
        let accessory = AccessoryConfig { volume, ..Default::default() };
        let device = SoundTouchDevice::from_client(client, &GlobalConfig::default(), &accessory)
            .await
            .unwrap();
        let sync = Arc::new(SelectorSyncPolicy::new(device.registry().unwrap(), Arc::new(NullSink)));
        let status = Arc::new(RecordingStatus::default());
        let controller = PowerVolumeController::new(Arc::new(device), sync, status.clone());
        fake.clear_requests();
        Harness { fake, controller, status }
    }

    fn on_value(value: u8) -> Option<VolumeConfig> {
        Some(VolumeConfig { on_value: Some(value), ..Default::default() })
    }

    fn radio() -> ContentItem {
        ContentItem::new("INTERNET_RADIO")
            .with_type("stationurl")
            .with_location("4712")
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_waits_for_settle() {
        let h = harness(
            FakeDevice::new().with_settle_time(Duration::from_millis(500)),
            on_value(30),
        )
        .await;

        assert!(h.controller.set_power(true).await.unwrap());
        assert_eq!(h.fake.released_keys(), vec!["POWER".to_string()]);
        // Resolved from the post-settle state, not the standby it reports at first
        assert_eq!(h.controller.sync().active(), SelectorIdentity::Preset(1));
        assert_eq!(h.fake.volume(), 30);
        assert_eq!(h.status.take(), vec![Status::Power(true), Status::Volume(30)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_settle_misreads_selection() {
        let h = harness(
            FakeDevice::new().with_settle_time(Duration::from_millis(500)),
            None,
        )
        .await;
        let controller = PowerVolumeController::new(
            h.controller.device().clone(),
            h.controller.sync().clone(),
            Arc::new(NullStatus),
        )
        .with_settle_delay(Duration::from_millis(100));

        assert!(controller.set_power(true).await.unwrap());
        assert_eq!(controller.sync().active(), SelectorIdentity::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_already_in_state() {
        let h = harness(FakeDevice::new(), None).await;
        assert!(!h.controller.set_power(false).await.unwrap());
        assert!(h.fake.posted_bodies("key").is_empty());
        assert!(h.status.take().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_key_rejected_changes_nothing() {
        let h = harness(FakeDevice::new(), on_value(30)).await;
        h.fake.reject_action("key");

        assert!(!h.controller.set_power(true).await.unwrap());
        assert!(h.fake.posted_bodies("volume").is_empty());
        assert!(h.status.take().is_empty());
        assert_eq!(h.controller.sync().active(), SelectorIdentity::None);

        h.fake.clear_faults();
        h.fake.fail_action("key");
        assert!(matches!(
            h.controller.set_power(true).await,
            Err(SdkError::ApiError(ApiError::Transport(_)))
        ));
        assert!(h.fake.posted_bodies("volume").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_on_volume_fails_power_on() {
        let h = harness(FakeDevice::new(), on_value(30)).await;
        h.fake.reject_action("volume");

        assert!(!h.controller.set_power(true).await.unwrap());
        assert!(h.fake.is_powered());
        assert_eq!(h.fake.volume(), 20);
        assert_eq!(h.fake.posted_bodies("volume").len(), 1);
        assert_eq!(h.status.take(), vec![Status::Power(true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_off_clears_selection() {
        let h = harness(FakeDevice::new().playing(radio()), None).await;
        h.controller.refresh().await.unwrap();
        assert_eq!(h.controller.sync().active(), SelectorIdentity::Preset(1));
        h.status.take();

        assert!(h.controller.set_power(false).await.unwrap());
        assert!(!h.fake.is_powered());
        assert_eq!(h.controller.sync().active(), SelectorIdentity::None);
        assert_eq!(h.status.take(), vec![Status::Power(false)]);
    }

    #[rstest]
    #[case(20, 100, 35)]
    #[case(60, 100, 100)]
    #[case(50, 100, 50)]
    #[case(20, 80, 80)]
    #[case(20, 150, 35)]
    #[tokio::test(start_paused = true)]
    async fn test_unmute_guard(#[case] current: u8, #[case] requested: u8, #[case] sent: u8) {
        let h = harness(FakeDevice::new().with_volume(current), None).await;
        assert!(h.controller.set_volume(requested, true).await.unwrap());
        assert_eq!(h.fake.volume(), sent);
        assert_eq!(h.status.take(), vec![Status::Volume(sent)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_clamped_to_configured_max() {
        let volume = Some(VolumeConfig { max_value: Some(60), ..Default::default() });
        let h = harness(FakeDevice::new().with_volume(40), volume).await;

        assert!(h.controller.set_volume(90, true).await.unwrap());
        assert_eq!(h.fake.volume(), 60);

        h.fake.set_volume(20);
        assert!(h.controller.set_volume(60, true).await.unwrap());
        assert_eq!(h.fake.volume(), 35);

        assert!(h.controller.set_volume(90, false).await.unwrap());
        assert_eq!(h.fake.volume(), 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mute_while_off() {
        let h = harness(FakeDevice::new(), None).await;
        assert!(!h.controller.set_mute(true).await.unwrap());
        assert!(h.fake.posted_bodies("key").is_empty());

        // Unmuting a device in standby powers it on rather than pressing mute
        assert!(h.controller.set_mute(false).await.unwrap());
        assert!(h.fake.is_powered());
        assert!(!h.fake.is_muted());
        assert_eq!(h.fake.released_keys(), vec!["POWER".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mute_while_on() {
        let h = harness(FakeDevice::new().playing(radio()), None).await;
        assert!(!h.controller.set_mute(false).await.unwrap());
        assert!(h.fake.posted_bodies("key").is_empty());

        assert!(h.controller.set_mute(true).await.unwrap());
        assert!(h.fake.is_muted());
        assert!(h.controller.get_mute().await.unwrap());
        assert_eq!(h.status.take(), vec![Status::Mute(true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_preset_powers_on_first() {
        let h = harness(FakeDevice::new(), None).await;

        assert!(h.controller.press_preset(2).await.unwrap());
        assert_eq!(
            h.fake.released_keys(),
            vec!["POWER".to_string(), "PRESET_2".to_string()]
        );
        assert_eq!(h.controller.sync().active(), SelectorIdentity::Preset(2));
        assert!(h.controller.is_selected(&SelectorIdentity::Preset(2)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_source() {
        let h = harness(FakeDevice::new().playing(radio()), None).await;
        h.controller.refresh().await.unwrap();

        assert!(h.controller.select_source("AUX", Some("AUX")).await.unwrap());
        let aux = SelectorIdentity::source("AUX", Some("AUX"));
        assert_eq!(h.controller.sync().active(), aux);
        assert_eq!(h.fake.content().source, "AUX");

        let bodies = h.fake.posted_bodies("select");
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains(r#"source="AUX""#));
        assert!(bodies[0].contains(r#"sourceAccount="AUX""#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_selection_keeps_registry() {
        let h = harness(FakeDevice::new().playing(radio()), None).await;
        h.controller.refresh().await.unwrap();
        h.fake.reject_action("select");

        assert!(!h.controller.select_source("AUX", Some("AUX")).await.unwrap());
        assert_eq!(h.controller.sync().active(), SelectorIdentity::Preset(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_preset_index() {
        let h = harness(FakeDevice::new(), None).await;
        assert!(matches!(
            h.controller.press_preset(7).await,
            Err(SdkError::ApiError(ApiError::InvalidParameter(_)))
        ));
        assert!(h.fake.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_selector_off() {
        let h = harness(FakeDevice::new().playing(radio()), None).await;

        // Not playing, nothing to switch off
        assert!(!h.controller.set_selector(&SelectorIdentity::Preset(2), false).await.unwrap());
        assert!(h.fake.is_powered());

        assert!(h.controller.set_selector(&SelectorIdentity::Preset(1), false).await.unwrap());
        assert!(!h.fake.is_powered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_state() {
        let h = harness(FakeDevice::new().playing(radio()).with_volume(40), None).await;
        let now_playing = h.controller.refresh().await.unwrap();
        assert_eq!(now_playing.item_name.as_deref(), Some("Radio Paradise"));
        assert_eq!(
            h.status.take(),
            vec![Status::Power(true), Status::Volume(40), Status::Mute(false)]
        );
    }
}
