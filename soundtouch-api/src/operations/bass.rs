//! `bassCapabilities` and `bass` pass-through

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{child_text, expect_root, parse_bool, parse_child, DeviceCommand, DeviceQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BassCapabilities {
    pub available: bool,
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bass {
    pub target: i32,
    pub actual: i32,
}

/// GET `bassCapabilities`
pub struct BassCapabilitiesQuery;

impl DeviceQuery for BassCapabilitiesQuery {
    type Response = BassCapabilities;

    const ACTION: &'static str = "bassCapabilities";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        expect_root(xml, "bassCapabilities")?;
        Ok(BassCapabilities {
            available: child_text(xml, "bassAvailable").map_or(false, |t| parse_bool(&t)),
            min: parse_child(xml, "bassMin")?.unwrap_or(0),
            max: parse_child(xml, "bassMax")?.unwrap_or(0),
            default: parse_child(xml, "bassDefault")?.unwrap_or(0),
        })
    }
}

/// GET `bass`
pub struct BassQuery;

impl DeviceQuery for BassQuery {
    type Response = Bass;

    const ACTION: &'static str = "bass";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        expect_root(xml, "bass")?;
        let actual = parse_child(xml, "actualbass")?.ok_or_else(|| ApiError::missing("bass", "actualbass"))?;
        Ok(Bass {
            target: parse_child(xml, "targetbass")?.unwrap_or(actual),
            actual,
        })
    }
}

/// POST `bass`
pub struct SetBassCommand;

impl DeviceCommand for SetBassCommand {
    type Request = i32;

    const ACTION: &'static str = "bass";

    fn build_payload(request: &Self::Request) -> String {
        format!("<bass>{}</bass>", request)
    }
}
