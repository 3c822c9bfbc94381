//! `volume` query and command

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{child_text, expect_root, parse_bool, parse_child, DeviceCommand, DeviceQuery};

/// Volume state reported by `volume` and `volumeUpdated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub actual: u8,
    pub target: u8,
    pub is_muted: bool,
}

impl Volume {
    /// Parse a `<volume>` element
    pub fn from_element(xml: &Element) -> Result<Self> {
        expect_root(xml, "volume")?;
        let actual: u8 = parse_child(xml, "actualvolume")?
            .ok_or_else(|| ApiError::missing("volume", "actualvolume"))?;
        Ok(Self {
            actual,
            target: parse_child(xml, "targetvolume")?.unwrap_or(actual),
            is_muted: child_text(xml, "muteenabled").map_or(false, |t| parse_bool(&t)),
        })
    }
}

/// GET `volume`
pub struct VolumeQuery;

impl DeviceQuery for VolumeQuery {
    type Response = Volume;

    const ACTION: &'static str = "volume";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        Volume::from_element(xml)
    }
}

/// POST `volume` with an absolute level
pub struct SetVolumeCommand;

impl DeviceCommand for SetVolumeCommand {
    type Request = u8;

    const ACTION: &'static str = "volume";

    fn build_payload(request: &Self::Request) -> String {
        format!("<volume>{}</volume>", request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_client::parse_xml;

    #[test]
    fn test_parse_volume() {
        let xml = parse_xml(
            r#"<volume deviceID="689E19B8BB8A"><targetvolume>32</targetvolume><actualvolume>30</actualvolume><muteenabled>false</muteenabled></volume>"#,
        )
        .unwrap();
        let volume = VolumeQuery::parse_response(&xml).unwrap();
        assert_eq!(volume, Volume { actual: 30, target: 32, is_muted: false });
    }

    #[test]
    fn test_parse_muted_without_target() {
        let xml = parse_xml("<volume><actualvolume>0</actualvolume><muteenabled>true</muteenabled></volume>").unwrap();
        let volume = Volume::from_element(&xml).unwrap();
        assert_eq!(volume.target, 0);
        assert!(volume.is_muted);
    }

    #[test]
    fn test_missing_actual_is_protocol_error() {
        let xml = parse_xml("<volume><targetvolume>3</targetvolume></volume>").unwrap();
        assert!(matches!(Volume::from_element(&xml), Err(ApiError::Protocol(_))));
    }

    #[test]
    fn test_set_volume_payload() {
        assert_eq!(SetVolumeCommand::build_payload(&35), "<volume>35</volume>");
    }
}
