//! Operation framework for the SoundTouch command protocol
//!
//! Every endpoint on port 8090 is either a query (`GET /{action}`, answered
//! with a document describing device state) or a command (`POST /{action}`
//! with an XML body, answered with `<status>` or `<errors>`). The two traits
//! here give each endpoint a typed request/response pair so the client can
//! stay generic.

use xmltree::{Element, XMLNode};

use crate::error::{ApiError, Result};

/// A read-only endpoint that returns a parsed document
pub trait DeviceQuery {
    /// The typed response for this query
    type Response;

    /// Path segment of the endpoint, e.g. `now_playing`
    const ACTION: &'static str;

    /// Parse the response document into the typed response
    fn parse_response(xml: &Element) -> Result<Self::Response>;
}

/// A mutating endpoint that accepts an XML body
pub trait DeviceCommand {
    /// The typed request for this command
    type Request;

    /// Path segment of the endpoint, e.g. `key`
    const ACTION: &'static str;

    /// Build the XML body sent to the device
    fn build_payload(request: &Self::Request) -> String;
}

/// Escape a value for use inside an XML attribute or text node
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Check the root element name
pub(crate) fn expect_root(xml: &Element, name: &str) -> Result<()> {
    if xml.name == name {
        Ok(())
    } else {
        Err(ApiError::unexpected_root(name, &xml.name))
    }
}

/// Attribute value with empty strings treated as absent
pub(crate) fn attr(xml: &Element, name: &str) -> Option<String> {
    xml.attributes
        .get(name)
        .filter(|value| !value.is_empty())
        .cloned()
}

/// Trimmed text of a direct child, empty text treated as absent
pub(crate) fn child_text(xml: &Element, name: &str) -> Option<String> {
    xml.get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Trimmed text of the element itself
pub(crate) fn own_text(xml: &Element) -> Option<String> {
    xml.get_text()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Direct children with the given name
pub(crate) fn children<'a>(xml: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    xml.children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |child| child.name == name)
}

/// Parse a numeric child, reporting the element and field on failure
pub(crate) fn parse_child<T: std::str::FromStr>(xml: &Element, name: &str) -> Result<Option<T>> {
    match child_text(xml, name) {
        Some(text) => text.parse::<T>().map(Some).map_err(|_| {
            ApiError::Protocol(format!("<{}> has non-numeric '{}': {}", xml.name, name, text))
        }),
        None => Ok(None),
    }
}

pub(crate) fn parse_bool(text: &str) -> bool {
    text.eq_ignore_ascii_case("true")
}

/// Reason text from an `<errors>` document
pub(crate) fn rejection_reason(xml: &Element) -> String {
    let reasons: Vec<String> = children(xml, "error")
        .map(|error| {
            let name = attr(error, "name").unwrap_or_default();
            let value = attr(error, "value").unwrap_or_default();
            let text = own_text(error).unwrap_or_default();
            [value, name, text]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    if reasons.is_empty() {
        "unspecified error".to_string()
    } else {
        reasons.join("; ")
    }
}
