//! Multi-room zone pass-through

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::Result;
use crate::operation::{attr, children, escape_xml, expect_root, own_text, DeviceCommand, DeviceQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMember {
    pub mac_address: String,
    pub ip_address: Option<String>,
}

/// Zone membership; an empty `master` means the device is not grouped
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Zone {
    pub master: Option<String>,
    pub members: Vec<ZoneMember>,
}

/// GET `getZone`
pub struct ZoneQuery;

impl DeviceQuery for ZoneQuery {
    type Response = Zone;

    const ACTION: &'static str = "getZone";

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        expect_root(xml, "zone")?;
        Ok(Zone {
            master: attr(xml, "master"),
            members: children(xml, "member")
                .filter_map(|m| {
                    own_text(m).map(|mac_address| ZoneMember {
                        mac_address,
                        ip_address: attr(m, "ipaddress"),
                    })
                })
                .collect(),
        })
    }
}

/// Body shared by the three zone mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRequest {
    /// MAC address of the zone master
    pub master: String,
    /// MAC addresses of the members
    pub members: Vec<String>,
}

impl ZoneRequest {
    fn to_xml(&self) -> String {
        let mut body = format!(
            r#"<zone master="{}" senderIPAddress="127.0.0.1">"#,
            escape_xml(&self.master)
        );
        for member in &self.members {
            body.push_str(&format!("<member>{}</member>", escape_xml(member)));
        }
        body.push_str("</zone>");
        body
    }
}

macro_rules! zone_command {
    ($name:ident, $action:literal) => {
        #[doc = concat!("POST `", $action, "`")]
        pub struct $name;

        impl DeviceCommand for $name {
            type Request = ZoneRequest;

            const ACTION: &'static str = $action;

            fn build_payload(request: &Self::Request) -> String {
                request.to_xml()
            }
        }
    };
}

zone_command!(SetZoneCommand, "setZone");
zone_command!(AddZoneSlaveCommand, "addZoneSlave");
zone_command!(RemoveZoneSlaveCommand, "removeZoneSlave");
