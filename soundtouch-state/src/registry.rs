//! The set of selector entities exposed for one device

use std::collections::HashMap;

use soundtouch_api::Preset;

use crate::error::{Result, StateError};
use crate::resolver::{SelectorIdentity, SourceEntry};

/// Stable tag of a preset selector: `preset{n}Service`
pub fn preset_tag(index: u8) -> String {
    format!("preset{}Service", index)
}

/// Stable tag of a source selector: `{source lowercased}{account}Service`
pub fn source_tag(source: &str, account: Option<&str>) -> String {
    format!("{}{}Service", source.to_lowercase(), account.unwrap_or_default())
}

/// Tag of `identity`, or `None` for [`SelectorIdentity::None`]
pub fn tag_for(identity: &SelectorIdentity) -> Option<String> {
    match identity {
        SelectorIdentity::Preset(index) => Some(preset_tag(*index)),
        SelectorIdentity::Source { source, account } => Some(source_tag(source, account.as_deref())),
        SelectorIdentity::None => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEntry {
    pub identity: SelectorIdentity,
    pub tag: String,
    pub name: String,
}

/// Ordered selectors with at most one active
///
/// Presets come first in slot order, then sources in catalog order. The
/// active selector is a single index, so two entries can never be active at
/// once.
#[derive(Debug, Clone, Default)]
pub struct SelectorRegistry {
    entries: Vec<SelectorEntry>,
    index: HashMap<SelectorIdentity, usize>,
    active: Option<usize>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One selector per preset and one per enabled source
    pub fn from_catalog(presets: &[Preset], sources: &[SourceEntry]) -> Result<Self> {
        let mut registry = Self::new();

        let mut by_slot: Vec<&Preset> = presets.iter().collect();
        by_slot.sort_by_key(|preset| preset.id);
        for preset in by_slot {
            let name = preset
                .name
                .clone()
                .unwrap_or_else(|| format!("Preset {}", preset.id));
            registry.insert(SelectorIdentity::Preset(preset.id), name)?;
        }

        for source in sources.iter().filter(|source| source.enabled) {
            registry.insert(source.identity(), source.name.clone())?;
        }

        Ok(registry)
    }

    /// Append a selector and return its tag
    pub fn insert(&mut self, identity: SelectorIdentity, name: impl Into<String>) -> Result<String> {
        if let SelectorIdentity::Preset(index) = identity {
            if !(1..=6).contains(&index) {
                return Err(StateError::InvalidPresetIndex(index));
            }
        }
        let tag = tag_for(&identity).ok_or(StateError::UntaggedSelector)?;
        if self.index.contains_key(&identity) || self.entries.iter().any(|e| e.tag == tag) {
            return Err(StateError::DuplicateSelector(tag));
        }

        self.index.insert(identity.clone(), self.entries.len());
        self.entries.push(SelectorEntry {
            identity,
            tag: tag.clone(),
            name: name.into(),
        });
        Ok(tag)
    }

    pub fn entries(&self) -> &[SelectorEntry] {
        &self.entries
    }

    pub fn get(&self, identity: &SelectorIdentity) -> Option<&SelectorEntry> {
        self.index.get(identity).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, identity: &SelectorIdentity) -> bool {
        self.index.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active(&self) -> Option<&SelectorEntry> {
        self.active.map(|i| &self.entries[i])
    }

    pub fn active_identity(&self) -> SelectorIdentity {
        self.active()
            .map(|entry| entry.identity.clone())
            .unwrap_or(SelectorIdentity::None)
    }

    pub fn is_active(&self, identity: &SelectorIdentity) -> bool {
        match (self.active, self.index.get(identity)) {
            (Some(active), Some(&i)) => active == i,
            _ => false,
        }
    }

    /// Make `identity` the only active selector
    ///
    /// An identity without an entry (including `None`) leaves nothing
    /// active. Returns the previously active identity.
    pub fn set_active(&mut self, identity: &SelectorIdentity) -> SelectorIdentity {
        let previous = self.active_identity();
        self.active = self.index.get(identity).copied();
        previous
    }

    pub fn clear_active(&mut self) -> SelectorIdentity {
        self.set_active(&SelectorIdentity::None)
    }
}
