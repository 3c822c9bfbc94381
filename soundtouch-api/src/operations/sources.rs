//! `sources` query

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{attr, children, expect_root, own_text, parse_bool, DeviceQuery};

/// Availability reported for a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    Ready,
    Unavailable,
    Other(String),
}

impl SourceStatus {
    pub fn parse(text: &str) -> Self {
        match text {
            "READY" => SourceStatus::Ready,
            "UNAVAILABLE" => SourceStatus::Unavailable,
            other => SourceStatus::Other(other.to_string()),
        }
    }
}

/// One `<sourceItem>` advertised by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceItem {
    pub source: String,
    pub source_account: Option<String>,
    pub status: SourceStatus,
    pub is_local: bool,
    /// Text content of the element, e.g. `AUX IN`
    pub label: Option<String>,
}

impl SourceItem {
    pub fn from_element(xml: &Element) -> Result<Self> {
        expect_root(xml, "sourceItem")?;
        Ok(Self {
            source: attr(xml, "source").ok_or_else(|| ApiError::missing("sourceItem", "source"))?,
            source_account: attr(xml, "sourceAccount"),
            status: attr(xml, "status")
                .map(|s| SourceStatus::parse(&s))
                .unwrap_or(SourceStatus::Unavailable),
            is_local: attr(xml, "isLocal").map_or(false, |v| parse_bool(&v)),
            label: own_text(xml),
        })
    }
}

/// GET `sources`
pub struct SourcesQuery;

impl DeviceQuery for SourcesQuery {
    type Response = Vec<SourceItem>;

    const ACTION: &'static str = "sources";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        expect_root(xml, "sourceItems")?;
        children(xml, "sourceItem").map(SourceItem::from_element).collect()
    }
}
