//! `info` query

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{attr, child_text, children, expect_root, DeviceQuery};

/// Hardware/software component listed under `<components>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub category: Option<String>,
    pub software_version: Option<String>,
    pub serial_number: Option<String>,
}

/// Static device information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub device_id: String,
    pub name: String,
    pub device_type: Option<String>,
    pub components: Vec<Component>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
}

impl Info {
    pub fn from_element(xml: &Element) -> Result<Self> {
        expect_root(xml, "info")?;

        let components = xml
            .get_child("components")
            .map(|list| {
                children(list, "component")
                    .map(|c| Component {
                        category: child_text(c, "componentCategory"),
                        software_version: child_text(c, "softwareVersion"),
                        serial_number: child_text(c, "serialNumber"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let network = xml.get_child("networkInfo");

        Ok(Self {
            device_id: attr(xml, "deviceID").ok_or_else(|| ApiError::missing("info", "deviceID"))?,
            name: child_text(xml, "name").ok_or_else(|| ApiError::missing("info", "name"))?,
            device_type: child_text(xml, "type"),
            components,
            mac_address: network.and_then(|n| child_text(n, "macAddress")),
            ip_address: network.and_then(|n| child_text(n, "ipAddress")),
        })
    }

    /// Software version of the component whose serial number is the device id
    pub fn firmware_version(&self) -> Option<&str> {
        self.components
            .iter()
            .find(|c| {
                c.serial_number
                    .as_deref()
                    .map_or(false, |serial| serial.eq_ignore_ascii_case(&self.device_id))
            })
            .and_then(|c| c.software_version.as_deref())
    }

    /// MAC address used as zone master, falling back to the device id
    pub fn zone_address(&self) -> &str {
        self.mac_address.as_deref().unwrap_or(&self.device_id)
    }
}

/// GET `info`
pub struct InfoQuery;

impl DeviceQuery for InfoQuery {
    type Response = Info;

    const ACTION: &'static str = "info";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        Info::from_element(xml)
    }
}
