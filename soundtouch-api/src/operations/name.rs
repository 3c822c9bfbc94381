//! `name` command

use crate::operation::{escape_xml, DeviceCommand};

/// POST `name` to rename the device
pub struct SetNameCommand;

impl DeviceCommand for SetNameCommand {
    type Request = String;

    const ACTION: &'static str = "name";

    fn build_payload(request: &Self::Request) -> String {
        format!("<name>{}</name>", escape_xml(request))
    }
}
