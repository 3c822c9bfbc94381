//! `select` command

use crate::content_item::ContentItem;
use crate::operation::DeviceCommand;

/// POST `select` with a `<ContentItem>` body
///
/// All four attributes are always present; unset fields serialize as empty
/// strings because the device parser rejects missing attributes.
pub struct SelectCommand;

impl DeviceCommand for SelectCommand {
    type Request = ContentItem;

    const ACTION: &'static str = "select";

    fn build_payload(request: &Self::Request) -> String {
        request.to_select_xml()
    }
}
