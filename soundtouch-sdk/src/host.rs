//! Capabilities supplied by the home automation host
//!
//! The SDK never owns the host's entity registry. Each accessory receives an
//! [`EntityHost`] handle and asks it for the entities it needs by kind and
//! stable tag; the host decides how they are stored and rendered.

use std::collections::HashMap;
use std::sync::Arc;

use soundtouch_state::{SelectorEntry, SelectorSink};

use crate::config::VolumeMode;

/// Tag of the power switch
pub const POWER_TAG: &str = "onService";

/// Tag of the volume entity, whichever kind it is
pub const VOLUME_TAG: &str = "volumeService";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Switch,
    Lightbulb,
    Speaker,
}

/// An entity the host renders
///
/// Updates are pushed values, not requests: implementations store and
/// display them without calling back into the SDK.
pub trait HostEntity: Send + Sync {
    fn update_on(&self, on: bool);

    /// Volume or brightness level
    fn update_level(&self, _level: u8) {}

    fn update_mute(&self, _muted: bool) {}

    /// Upper bound of the level control
    fn set_level_range(&self, _max: u8) {}
}

pub trait EntityHost: Send + Sync {
    /// Existing entity with `tag`, or a new one named `name`
    fn get_or_create_entity(&self, kind: EntityKind, name: &str, tag: &str) -> Arc<dyn HostEntity>;

    /// Drop an entity left over from an earlier configuration
    fn remove_entity(&self, kind: EntityKind, tag: &str);
}

/// Forwards selector changes to the host switches, keyed by tag
#[derive(Default)]
pub struct SelectorToggles {
    switches: HashMap<String, Arc<dyn HostEntity>>,
}

impl SelectorToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, entity: Arc<dyn HostEntity>) {
        self.switches.insert(tag.into(), entity);
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}

impl SelectorSink for SelectorToggles {
    fn selector_changed(&self, entry: &SelectorEntry, active: bool) {
        if let Some(switch) = self.switches.get(&entry.tag) {
            switch.update_on(active);
        }
    }
}

/// Volume exposed as a dimmable light, a speaker or not at all
///
/// A lightbulb is on while the device is on and not muted; its brightness is
/// the volume. A speaker carries mute and volume directly.
#[derive(Clone)]
pub struct VolumePresentation {
    mode: VolumeMode,
    entity: Option<Arc<dyn HostEntity>>,
}

impl VolumePresentation {
    /// Create the entity for `mode` and remove the one for the other mode
    pub fn create(host: &dyn EntityHost, mode: VolumeMode, name: &str, max_value: u8) -> Self {
        let name = format!("{} Volume", name);
        let entity = match mode {
            VolumeMode::Lightbulb => {
                host.remove_entity(EntityKind::Speaker, VOLUME_TAG);
                Some(host.get_or_create_entity(EntityKind::Lightbulb, &name, VOLUME_TAG))
            }
            VolumeMode::Speaker => {
                host.remove_entity(EntityKind::Lightbulb, VOLUME_TAG);
                Some(host.get_or_create_entity(EntityKind::Speaker, &name, VOLUME_TAG))
            }
            VolumeMode::None => {
                host.remove_entity(EntityKind::Lightbulb, VOLUME_TAG);
                host.remove_entity(EntityKind::Speaker, VOLUME_TAG);
                None
            }
        };
        if let Some(entity) = &entity {
            entity.set_level_range(max_value);
        }
        Self { mode, entity }
    }

    pub fn mode(&self) -> VolumeMode {
        self.mode
    }

    pub fn is_exposed(&self) -> bool {
        self.entity.is_some()
    }

    pub fn publish_level(&self, level: u8) {
        if let Some(entity) = &self.entity {
            entity.update_level(level);
        }
    }

    pub fn publish_muted(&self, muted: bool) {
        let Some(entity) = &self.entity else { return };
        match self.mode {
            VolumeMode::Lightbulb => entity.update_on(!muted),
            VolumeMode::Speaker => entity.update_mute(muted),
            VolumeMode::None => {}
        }
    }

    /// A device in standby reads as a switched-off light
    pub fn publish_power(&self, on: bool) {
        if let (VolumeMode::Lightbulb, Some(entity)) = (self.mode, &self.entity) {
            if !on {
                entity.update_on(false);
            }
        }
    }

    /// Mute request carried by the host's toggle value
    pub fn muted_from_host(&self, value: bool) -> bool {
        match self.mode {
            VolumeMode::Lightbulb => !value,
            VolumeMode::Speaker | VolumeMode::None => value,
        }
    }

    /// Host toggle value for a device state
    pub fn host_value(&self, on: bool, muted: bool) -> bool {
        match self.mode {
            VolumeMode::Lightbulb => on && !muted,
            VolumeMode::Speaker | VolumeMode::None => !on || muted,
        }
    }
}

impl std::fmt::Debug for VolumePresentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumePresentation")
            .field("mode", &self.mode)
            .field("exposed", &self.entity.is_some())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::recording::{EntityEvent, RecordingHost};
    use super::*;
    use rstest::rstest;
    use soundtouch_state::SelectorIdentity;

    #[test]
    fn test_lightbulb_presentation() {
        let host = RecordingHost::default();
        let volume = VolumePresentation::create(&host, VolumeMode::Lightbulb, "Kitchen", 60);
        assert!(volume.is_exposed());
        assert_eq!(host.removed(), vec![(EntityKind::Speaker, VOLUME_TAG.to_string())]);

        let entity = host.entity(EntityKind::Lightbulb, VOLUME_TAG).unwrap();
        assert_eq!(entity.name, "Kitchen Volume");

        volume.publish_level(30);
        volume.publish_muted(true);
        volume.publish_power(true);
        volume.publish_power(false);
        assert_eq!(
            entity.events(),
            vec![
                EntityEvent::Range(60),
                EntityEvent::Level(30),
                EntityEvent::On(false),
                EntityEvent::On(false),
            ]
        );
    }

    #[test]
    fn test_speaker_presentation() {
        let host = RecordingHost::default();
        let volume = VolumePresentation::create(&host, VolumeMode::Speaker, "Kitchen", 100);
        volume.publish_muted(true);
        volume.publish_power(false);

        let entity = host.entity(EntityKind::Speaker, VOLUME_TAG).unwrap();
        assert_eq!(entity.events(), vec![EntityEvent::Range(100), EntityEvent::Mute(true)]);
    }

    #[test]
    fn test_hidden_volume_removes_both() {
        let host = RecordingHost::default();
        let volume = VolumePresentation::create(&host, VolumeMode::None, "Kitchen", 100);
        assert!(!volume.is_exposed());
        assert_eq!(host.removed().len(), 2);
        volume.publish_level(10);
    }

    #[rstest]
    #[case(VolumeMode::Lightbulb, true, false)]
    #[case(VolumeMode::Lightbulb, false, true)]
    #[case(VolumeMode::Speaker, true, true)]
    #[case(VolumeMode::Speaker, false, false)]
    fn test_muted_from_host(#[case] mode: VolumeMode, #[case] value: bool, #[case] muted: bool) {
        let host = RecordingHost::default();
        let volume = VolumePresentation::create(&host, mode, "Kitchen", 100);
        assert_eq!(volume.muted_from_host(value), muted);
    }

    #[test]
    fn test_host_value() {
        let host = RecordingHost::default();
        let light = VolumePresentation::create(&host, VolumeMode::Lightbulb, "Kitchen", 100);
        assert!(light.host_value(true, false));
        assert!(!light.host_value(false, false));
        assert!(!light.host_value(true, true));
    }

    #[test]
    fn test_selector_toggles_forward_by_tag() {
        let host = RecordingHost::default();
        let mut toggles = SelectorToggles::new();
        toggles.insert("preset1Service", host.get_or_create_entity(EntityKind::Switch, "Radio", "preset1Service"));

        let entry = SelectorEntry {
            identity: SelectorIdentity::Preset(1),
            tag: "preset1Service".to_string(),
            name: "Radio".to_string(),
        };
        toggles.selector_changed(&entry, true);
        let unknown = SelectorEntry { tag: "preset9Service".to_string(), ..entry };
        toggles.selector_changed(&unknown, true);

        assert_eq!(host.switch("preset1Service").events(), vec![EntityEvent::On(true)]);
        assert_eq!(toggles.len(), 1);
    }
}
