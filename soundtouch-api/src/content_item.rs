//! The device's identifier for a playable item

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{attr, child_text, escape_xml, expect_root};

/// Playable item as reported in presets, now-playing and selection updates
///
/// Equality and hashing cover exactly the four identifying fields. Empty
/// attributes are normalized to `None` while parsing, so an item read from
/// `now_playing` compares equal to the same item read from `presets`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub source: String,
    pub item_type: Option<String>,
    pub location: Option<String>,
    pub source_account: Option<String>,
}

impl ContentItem {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            item_type: None,
            location: None,
            source_account: None,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.source_account = Some(account.into()).filter(|a: &String| !a.is_empty());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into()).filter(|l: &String| !l.is_empty());
        self
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into()).filter(|t: &String| !t.is_empty());
        self
    }

    /// Parse a `<ContentItem>` element
    pub fn from_element(xml: &Element) -> Result<Self> {
        expect_root(xml, "ContentItem")?;
        let source = attr(xml, "source").ok_or_else(|| ApiError::missing("ContentItem", "source"))?;
        Ok(Self {
            source,
            item_type: attr(xml, "type"),
            location: attr(xml, "location"),
            source_account: attr(xml, "sourceAccount"),
        })
    }

    /// Display name carried alongside a `<ContentItem>` element
    pub fn item_name(xml: &Element) -> Option<String> {
        child_text(xml, "itemName")
    }

    /// Serialize as the body of a `select` command
    pub fn to_select_xml(&self) -> String {
        format!(
            r#"<ContentItem source="{}" type="{}" sourceAccount="{}" location="{}"><itemName>Select using API</itemName></ContentItem>"#,
            escape_xml(&self.source),
            escape_xml(self.item_type.as_deref().unwrap_or_default()),
            escape_xml(self.source_account.as_deref().unwrap_or_default()),
            escape_xml(self.location.as_deref().unwrap_or_default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_client::parse_xml;
    use std::collections::HashSet;

    #[test]
    fn test_parse_content_item() {
        let xml = parse_xml(
            r#"<ContentItem source="INTERNET_RADIO" type="stationurl" location="4712" sourceAccount="" isPresetable="true"><itemName>Radio Paradise</itemName></ContentItem>"#,
        )
        .unwrap();

        let item = ContentItem::from_element(&xml).unwrap();
        assert_eq!(item.source, "INTERNET_RADIO");
        assert_eq!(item.item_type.as_deref(), Some("stationurl"));
        assert_eq!(item.location.as_deref(), Some("4712"));
        assert_eq!(item.source_account, None);
        assert_eq!(ContentItem::item_name(&xml).as_deref(), Some("Radio Paradise"));
    }

    #[test]
    fn test_missing_source_is_protocol_error() {
        let xml = parse_xml(r#"<ContentItem location="x"/>"#).unwrap();
        assert!(matches!(ContentItem::from_element(&xml), Err(ApiError::Protocol(_))));
    }

    #[test]
    fn test_equality_ignores_display_fields() {
        let from_presets = parse_xml(
            r#"<ContentItem source="SPOTIFY" type="uri" location="spotify:playlist:1" sourceAccount="me" isPresetable="true"><itemName>Morning</itemName></ContentItem>"#,
        )
        .unwrap();
        let from_now_playing = parse_xml(
            r#"<ContentItem source="SPOTIFY" type="uri" location="spotify:playlist:1" sourceAccount="me"><itemName>Something else</itemName></ContentItem>"#,
        )
        .unwrap();

        let a = ContentItem::from_element(&from_presets).unwrap();
        let b = ContentItem::from_element(&from_now_playing).unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&b.clone().with_location("spotify:playlist:2")));
    }

    #[test]
    fn test_select_xml_escapes_attributes() {
        let item = ContentItem::new("STORED_MUSIC")
            .with_account("nas&co")
            .with_location("1$4\"x")
            .with_type("");
        assert_eq!(item.item_type, None);
        assert_eq!(
            item.to_select_xml(),
            r#"<ContentItem source="STORED_MUSIC" type="" sourceAccount="nas&amp;co" location="1$4&quot;x"><itemName>Select using API</itemName></ContentItem>"#
        );
    }
}
