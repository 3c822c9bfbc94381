//! Update frames pushed over the event channel
//!
//! Every frame is an `<updates deviceID="...">` document whose children name
//! the category (`nowPlayingUpdated`, `volumeUpdated`, ...). Anything else,
//! including `<SoundTouchSdkInfo>` sent right after the handshake, is
//! reported as [`DeviceUpdate::Unrecognized`].

use http_client::parse_xml;
use soundtouch_api::{ApiError, ContentItem, NowPlaying, Preset, Volume};
use xmltree::{Element, XMLNode};

use crate::error::{Result, StreamError};

/// Network connection state of the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub state: String,
    pub up: bool,
    pub signal: Option<String>,
}

/// The preset slot the device reports as currently selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowSelection {
    pub preset: Preset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentItem {
    pub content_item: ContentItem,
    pub name: Option<String>,
}

/// The device's list of recently played items
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecentsUpdate {
    pub items: Vec<RecentItem>,
}

/// One normalized update
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceUpdate {
    NowPlaying(NowPlaying),
    Volume(Volume),
    ConnectionState(ConnectionState),
    NowSelection(NowSelection),
    Recents(RecentsUpdate),
    /// Element name of a frame or child that has no category
    Unrecognized(String),
}

impl DeviceUpdate {
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceUpdate::NowPlaying(_) => "nowPlayingUpdated",
            DeviceUpdate::Volume(_) => "volumeUpdated",
            DeviceUpdate::ConnectionState(_) => "connectionStateUpdated",
            DeviceUpdate::NowSelection(_) => "nowSelectionUpdated",
            DeviceUpdate::Recents(_) => "recentsUpdated",
            DeviceUpdate::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Parse a text frame into its updates
pub fn parse_frame(text: &str) -> Result<Vec<DeviceUpdate>> {
    let root = parse_xml(text).map_err(|e| StreamError::Parse(e.to_string()))?;
    if root.name != "updates" {
        return Ok(vec![DeviceUpdate::Unrecognized(root.name)]);
    }

    let updates: Vec<DeviceUpdate> = elements(&root)
        .map(parse_update)
        .collect::<Result<_>>()?;

    if updates.is_empty() {
        return Ok(vec![DeviceUpdate::Unrecognized(root.name)]);
    }
    Ok(updates)
}

fn parse_update(update: &Element) -> Result<DeviceUpdate> {
    let parsed = match update.name.as_str() {
        "nowPlayingUpdated" => DeviceUpdate::NowPlaying(
            NowPlaying::from_element(required(update, "nowPlaying")?).map_err(invalid)?,
        ),
        "volumeUpdated" => {
            DeviceUpdate::Volume(Volume::from_element(required(update, "volume")?).map_err(invalid)?)
        }
        "connectionStateUpdated" => DeviceUpdate::ConnectionState(ConnectionState {
            state: update.attributes.get("state").cloned().unwrap_or_default(),
            up: update.attributes.get("up").map_or(false, |v| v.eq_ignore_ascii_case("true")),
            signal: update.attributes.get("signal").filter(|s| !s.is_empty()).cloned(),
        }),
        "nowSelectionUpdated" => DeviceUpdate::NowSelection(NowSelection {
            preset: Preset::from_element(required(update, "preset")?).map_err(invalid)?,
        }),
        "recentsUpdated" => DeviceUpdate::Recents(parse_recents(update)),
        other => DeviceUpdate::Unrecognized(other.to_string()),
    };
    Ok(parsed)
}

fn parse_recents(update: &Element) -> RecentsUpdate {
    let items = update
        .get_child("recents")
        .map(|recents| {
            elements(recents)
                .filter_map(|recent| {
                    elements(recent).find(|c| c.name.eq_ignore_ascii_case("contentItem"))
                })
                .filter_map(|item| {
                    let attr = |name: &str| item.attributes.get(name).filter(|v| !v.is_empty()).cloned();
                    let content_item = ContentItem {
                        source: attr("source")?,
                        item_type: attr("type"),
                        location: attr("location"),
                        source_account: attr("sourceAccount"),
                    };
                    let name = item
                        .get_child("itemName")
                        .and_then(|n| n.get_text())
                        .map(|t| t.trim().to_string());
                    Some(RecentItem { content_item, name })
                })
                .collect()
        })
        .unwrap_or_default();
    RecentsUpdate { items }
}

fn required<'a>(parent: &'a Element, name: &str) -> Result<&'a Element> {
    parent
        .get_child(name)
        .ok_or_else(|| StreamError::Parse(format!("<{}> is missing <{}>", parent.name, name)))
}

fn elements(parent: &Element) -> impl Iterator<Item = &Element> {
    parent.children.iter().filter_map(XMLNode::as_element)
}

fn invalid(error: ApiError) -> StreamError {
    StreamError::Parse(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundtouch_api::PlayStatus;

    #[test]
    fn test_now_playing_frame() {
        let frame = r#"<updates deviceID="689E19B8BB8A"><nowPlayingUpdated><nowPlaying deviceID="689E19B8BB8A" source="AUX" sourceAccount="AUX"><ContentItem source="AUX" sourceAccount="AUX" isPresetable="false"><itemName>AUX IN</itemName></ContentItem><playStatus>PLAY_STATE</playStatus></nowPlaying></nowPlayingUpdated></updates>"#;
        let updates = parse_frame(frame).unwrap();
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            DeviceUpdate::NowPlaying(np) => {
                assert_eq!(np.source, "AUX");
                assert_eq!(np.play_status, Some(PlayStatus::Play));
            }
            other => panic!("Expected NowPlaying update, got {:?}", other),
        }
    }

    #[test]
    fn test_volume_frame() {
        let frame = r#"<updates deviceID="A"><volumeUpdated><volume><targetvolume>25</targetvolume><actualvolume>25</actualvolume><muteenabled>true</muteenabled></volume></volumeUpdated></updates>"#;
        match parse_frame(frame).unwrap().as_slice() {
            [DeviceUpdate::Volume(volume)] => {
                assert_eq!(volume.actual, 25);
                assert!(volume.is_muted);
            }
            other => panic!("Expected Volume update, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_state_frame() {
        let frame = r#"<updates deviceID="A"><connectionStateUpdated state="NETWORK_WIFI_CONNECTED" up="true" signal="EXCELLENT_SIGNAL" /></updates>"#;
        assert_eq!(
            parse_frame(frame).unwrap(),
            vec![DeviceUpdate::ConnectionState(ConnectionState {
                state: "NETWORK_WIFI_CONNECTED".to_string(),
                up: true,
                signal: Some("EXCELLENT_SIGNAL".to_string()),
            })]
        );
    }

    #[test]
    fn test_now_selection_frame() {
        let frame = r#"<updates deviceID="A"><nowSelectionUpdated><preset id="2"><ContentItem source="INTERNET_RADIO" location="4712" sourceAccount="" isPresetable="true"><itemName>Radio</itemName></ContentItem></preset></nowSelectionUpdated></updates>"#;
        match parse_frame(frame).unwrap().as_slice() {
            [DeviceUpdate::NowSelection(selection)] => {
                assert_eq!(selection.preset.id, 2);
                assert_eq!(selection.preset.name.as_deref(), Some("Radio"));
            }
            other => panic!("Expected NowSelection update, got {:?}", other),
        }
    }

    #[test]
    fn test_recents_frame() {
        let frame = r#"<updates deviceID="A"><recentsUpdated><recents><recent deviceID="A" utcTime="1500000000" id="1"><contentItem source="SPOTIFY" type="uri" location="spotify:album:1" sourceAccount="me" isPresetable="true"><itemName>Album</itemName></contentItem></recent><recent id="2"/></recents></recentsUpdated></updates>"#;
        match parse_frame(frame).unwrap().as_slice() {
            [DeviceUpdate::Recents(recents)] => {
                assert_eq!(recents.items.len(), 1);
                assert_eq!(recents.items[0].content_item.source_account.as_deref(), Some("me"));
                assert_eq!(recents.items[0].name.as_deref(), Some("Album"));
            }
            other => panic!("Expected Recents update, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_frames() {
        let sdk_info = r#"<SoundTouchSdkInfo serverVersion="4" serverBuild="trunk r42017 v4 epdbuild cepeswbld02" />"#;
        assert_eq!(
            parse_frame(sdk_info).unwrap(),
            vec![DeviceUpdate::Unrecognized("SoundTouchSdkInfo".to_string())]
        );

        let activity = r#"<updates deviceID="A"><userActivityUpdate /></updates>"#;
        assert_eq!(
            parse_frame(activity).unwrap(),
            vec![DeviceUpdate::Unrecognized("userActivityUpdate".to_string())]
        );

        let empty = r#"<updates deviceID="A"></updates>"#;
        assert_eq!(parse_frame(empty).unwrap(), vec![DeviceUpdate::Unrecognized("updates".to_string())]);
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(parse_frame("not xml"), Err(StreamError::Parse(_))));
        assert!(matches!(
            parse_frame(r#"<updates><volumeUpdated/></updates>"#),
            Err(StreamError::Parse(_))
        ));
        assert!(matches!(
            parse_frame(r#"<updates><nowPlayingUpdated><nowPlaying/></nowPlayingUpdated></updates>"#),
            Err(StreamError::Parse(_))
        ));
    }
}
