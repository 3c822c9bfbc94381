//! `presets` query

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::content_item::ContentItem;
use crate::error::{ApiError, Result};
use crate::operation::{attr, children, expect_root, DeviceQuery};

/// A slot programmed on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Slot number, 1..=6
    pub id: u8,
    pub content_item: ContentItem,
    /// `itemName` of the stored content
    pub name: Option<String>,
}

impl Preset {
    pub fn from_element(xml: &Element) -> Result<Self> {
        expect_root(xml, "preset")?;
        let id = attr(xml, "id")
            .ok_or_else(|| ApiError::missing("preset", "id"))?
            .parse::<u8>()
            .map_err(|e| ApiError::Protocol(format!("Invalid preset id: {}", e)))?;
        let item = xml
            .get_child("ContentItem")
            .ok_or_else(|| ApiError::missing("preset", "ContentItem"))?;
        Ok(Self {
            id,
            content_item: ContentItem::from_element(item)?,
            name: ContentItem::item_name(item),
        })
    }
}

/// GET `presets`, returned in ascending slot order
pub struct PresetsQuery;

impl DeviceQuery for PresetsQuery {
    type Response = Vec<Preset>;

    const ACTION: &'static str = "presets";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        expect_root(xml, "presets")?;
        let mut presets = children(xml, "preset")
            .map(Preset::from_element)
            .collect::<Result<Vec<_>>>()?;
        presets.sort_by_key(|preset| preset.id);
        Ok(presets)
    }
}
