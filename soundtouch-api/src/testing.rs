//! Scripted in-memory device for tests
//!
//! [`FakeDevice`] implements [`Transport`] and answers the command protocol
//! the way a real speaker does: key strokes take effect on release, `select`
//! powers the device on, and unknown endpoints answer with `<errors>`. Every
//! request is recorded before any injected fault is applied.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use http_client::{parse_xml, HttpError, HttpResponse, Transport};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::content_item::ContentItem;
use crate::operation::escape_xml;
use crate::operations::{KeyValue, Preset, SourceItem, SourceStatus, ZoneRequest};

/// A request as seen by the fake device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Get { action: String },
    Post { action: String, body: String },
}

impl RecordedRequest {
    pub fn action(&self) -> &str {
        match self {
            RecordedRequest::Get { action } | RecordedRequest::Post { action, .. } => action,
        }
    }
}

#[derive(Debug)]
struct FakeState {
    name: String,
    device_id: String,
    powered: bool,
    content: ContentItem,
    playing: bool,
    volume: u8,
    muted: bool,
    bass: i32,
    presets: Vec<Preset>,
    sources: Vec<SourceItem>,
    zone: Option<(String, ZoneRequest)>,
    settle_time: Duration,
    settled_at: Option<Instant>,
    requests: Vec<RecordedRequest>,
    unreachable: bool,
    failing: HashSet<String>,
    rejected: HashSet<String>,
}

#[derive(Debug)]
pub struct FakeDevice {
    state: Mutex<FakeState>,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDevice {
    /// A device named "Kitchen" in standby at volume 20, with three presets
    /// and four sources (three of them local)
    pub fn new() -> Self {
        let presets = vec![
            Preset {
                id: 1,
                content_item: ContentItem::new("INTERNET_RADIO")
                    .with_type("stationurl")
                    .with_location("4712"),
                name: Some("Radio Paradise".to_string()),
            },
            Preset {
                id: 2,
                content_item: ContentItem::new("SPOTIFY")
                    .with_type("uri")
                    .with_location("spotify:playlist:focus")
                    .with_account("user1"),
                name: Some("Focus".to_string()),
            },
            Preset {
                id: 3,
                content_item: ContentItem::new("STORED_MUSIC")
                    .with_location("6_a2874b5d_4f83d999")
                    .with_account("d09708a1-5953-44bc-a413-123456789012/0"),
                name: Some("Jazz".to_string()),
            },
        ];
        let sources = vec![
            source_item("AUX", Some("AUX"), Some("AUX IN"), true),
            source_item("BLUETOOTH", None, None, true),
            source_item("PRODUCT", Some("TV"), Some("TV"), true),
            source_item("SPOTIFY", Some("user1"), Some("user1"), false),
        ];
        let resume = presets[0].content_item.clone();

        Self {
            state: Mutex::new(FakeState {
                name: "Kitchen".to_string(),
                device_id: "689E19B8BB8A".to_string(),
                powered: false,
                content: resume,
                playing: false,
                volume: 20,
                muted: false,
                bass: 0,
                presets,
                sources,
                zone: None,
                settle_time: Duration::ZERO,
                settled_at: None,
                requests: Vec::new(),
                unreachable: false,
                failing: HashSet::new(),
                rejected: HashSet::new(),
            }),
        }
    }

    pub fn with_name(self, name: &str) -> Self {
        self.state.lock().name = name.to_string();
        self
    }

    /// Start powered on and playing `content`
    pub fn playing(self, content: ContentItem) -> Self {
        {
            let mut state = self.state.lock();
            state.powered = true;
            state.playing = true;
            state.content = content;
        }
        self
    }

    pub fn with_volume(self, volume: u8) -> Self {
        self.state.lock().volume = volume;
        self
    }

    pub fn with_muted(self, muted: bool) -> Self {
        self.state.lock().muted = muted;
        self
    }

    pub fn with_presets(self, presets: Vec<Preset>) -> Self {
        self.state.lock().presets = presets;
        self
    }

    pub fn with_sources(self, sources: Vec<SourceItem>) -> Self {
        self.state.lock().sources = sources;
        self
    }

    /// After a power-on, `now_playing` keeps reporting standby for `settle`
    pub fn with_settle_time(self, settle: Duration) -> Self {
        self.state.lock().settle_time = settle;
        self
    }

    /// Fail every request to `action` with a network error
    pub fn fail_action(&self, action: &str) {
        self.state.lock().failing.insert(action.to_string());
    }

    /// Answer every request to `action` with `<errors>`
    pub fn reject_action(&self, action: &str) {
        self.state.lock().rejected.insert(action.to_string());
    }

    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.failing.clear();
        state.rejected.clear();
        state.unreachable = false;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Simulate a change made from another controller
    pub fn set_content(&self, content: ContentItem) {
        let mut state = self.state.lock();
        state.powered = true;
        state.playing = true;
        state.content = content;
    }

    /// Simulate the device being switched off from elsewhere
    pub fn set_standby(&self) {
        let mut state = self.state.lock();
        state.powered = false;
        state.playing = false;
    }

    pub fn set_volume(&self, volume: u8) {
        self.state.lock().volume = volume;
    }

    /// Simulate slots being stored from the device's own buttons or app
    pub fn set_presets(&self, presets: Vec<Preset>) {
        self.state.lock().presets = presets;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    /// Bodies of every POST to `action`, in order
    pub fn posted_bodies(&self, action: &str) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .filter_map(|r| match r {
                RecordedRequest::Post { action: a, body } if a == action => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    /// Keys pressed and released, in order
    pub fn released_keys(&self) -> Vec<String> {
        self.posted_bodies("key")
            .iter()
            .filter(|body| body.contains(r#"state="release""#))
            .filter_map(|body| parse_xml(body).ok())
            .filter_map(|xml| xml.get_text().map(|t| t.to_string()))
            .collect()
    }

    pub fn is_powered(&self) -> bool {
        self.state.lock().powered
    }

    pub fn volume(&self) -> u8 {
        self.state.lock().volume
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    pub fn content(&self) -> ContentItem {
        self.state.lock().content.clone()
    }

    pub fn device_name(&self) -> String {
        self.state.lock().name.clone()
    }

    pub fn zone(&self) -> Option<(String, ZoneRequest)> {
        self.state.lock().zone.clone()
    }

    pub fn bass(&self) -> i32 {
        self.state.lock().bass
    }

    fn admit(&self, request: RecordedRequest) -> Result<Option<HttpResponse>, HttpError> {
        let mut state = self.state.lock();
        let action = request.action().to_string();
        state.requests.push(request);

        if state.unreachable || state.failing.contains(&action) {
            return Err(HttpError::Network(format!(
                "Connection refused while requesting '{}'",
                action
            )));
        }
        if state.rejected.contains(&action) {
            return Ok(Some(errors_response(&state.device_id, "1019", "CLIENT_XML_ERROR")));
        }
        Ok(None)
    }
}

fn source_item(source: &str, account: Option<&str>, label: Option<&str>, is_local: bool) -> SourceItem {
    SourceItem {
        source: source.to_string(),
        source_account: account.map(str::to_string),
        status: SourceStatus::Ready,
        is_local,
        label: label.map(str::to_string),
    }
}

fn action_of(url: &str) -> String {
    url.rsplit('/').next().unwrap_or_default().to_string()
}

fn status_response(action: &str) -> HttpResponse {
    HttpResponse::new(
        200,
        format!(r#"<?xml version="1.0" encoding="UTF-8" ?><status>/{}</status>"#, action),
    )
}

fn errors_response(device_id: &str, value: &str, name: &str) -> HttpResponse {
    HttpResponse::new(
        400,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?><errors deviceID="{}"><error value="{}" name="{}" severity="Unknown">{}</error></errors>"#,
            device_id, value, name, value
        ),
    )
}

fn content_item_xml(item: &ContentItem, name: Option<&str>) -> String {
    let mut attrs = format!(r#"source="{}""#, escape_xml(&item.source));
    if let Some(t) = &item.item_type {
        attrs.push_str(&format!(r#" type="{}""#, escape_xml(t)));
    }
    if let Some(l) = &item.location {
        attrs.push_str(&format!(r#" location="{}""#, escape_xml(l)));
    }
    attrs.push_str(&format!(
        r#" sourceAccount="{}""#,
        escape_xml(item.source_account.as_deref().unwrap_or_default())
    ));
    match name {
        Some(name) => format!(
            r#"<ContentItem {} isPresetable="true"><itemName>{}</itemName></ContentItem>"#,
            attrs,
            escape_xml(name)
        ),
        None => format!(r#"<ContentItem {} isPresetable="true" />"#, attrs),
    }
}

impl FakeState {
    fn reports_standby(&self) -> bool {
        !self.powered || self.settled_at.map_or(false, |at| Instant::now() < at)
    }

    fn now_playing_xml(&self) -> String {
        if self.reports_standby() {
            return format!(
                r#"<?xml version="1.0" encoding="UTF-8" ?><nowPlaying deviceID="{}" source="STANDBY"><ContentItem source="STANDBY" isPresetable="true" /></nowPlaying>"#,
                self.device_id
            );
        }

        let name = self
            .presets
            .iter()
            .find(|p| p.content_item == self.content)
            .and_then(|p| p.name.as_deref());
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?><nowPlaying deviceID="{}" source="{}" sourceAccount="{}">{}<track>Track</track><artist>Artist</artist><playStatus>{}</playStatus></nowPlaying>"#,
            self.device_id,
            escape_xml(&self.content.source),
            escape_xml(self.content.source_account.as_deref().unwrap_or_default()),
            content_item_xml(&self.content, name),
            if self.playing { "PLAY_STATE" } else { "PAUSE_STATE" },
        )
    }

    fn get(&self, action: &str) -> HttpResponse {
        let body = match action {
            "now_playing" | "trackInfo" => self.now_playing_xml(),
            "volume" => format!(
                r#"<?xml version="1.0" encoding="UTF-8" ?><volume deviceID="{}"><targetvolume>{}</targetvolume><actualvolume>{}</actualvolume><muteenabled>{}</muteenabled></volume>"#,
                self.device_id, self.volume, self.volume, self.muted
            ),
            "presets" => {
                let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8" ?><presets>"#);
                for preset in &self.presets {
                    body.push_str(&format!(
                        r#"<preset id="{}">{}</preset>"#,
                        preset.id,
                        content_item_xml(&preset.content_item, preset.name.as_deref())
                    ));
                }
                body.push_str("</presets>");
                body
            }
            "sources" => {
                let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8" ?><sourceItems>"#);
                for item in &self.sources {
                    body.push_str(&format!(
                        r#"<sourceItem source="{}" sourceAccount="{}" status="READY" isLocal="{}" multiroomallowed="true">{}</sourceItem>"#,
                        escape_xml(&item.source),
                        escape_xml(item.source_account.as_deref().unwrap_or_default()),
                        item.is_local,
                        escape_xml(item.label.as_deref().unwrap_or_default())
                    ));
                }
                body.push_str("</sourceItems>");
                body
            }
            "info" => format!(
                r#"<?xml version="1.0" encoding="UTF-8" ?><info deviceID="{id}"><name>{name}</name><type>SoundTouch 10</type><components><component><componentCategory>SCM</componentCategory><softwareVersion>27.0.6.46330.5043500</softwareVersion><serialNumber>{serial}</serialNumber></component></components><networkInfo type="SCM"><macAddress>{id}</macAddress><ipAddress>192.168.1.20</ipAddress></networkInfo></info>"#,
                id = self.device_id,
                name = escape_xml(&self.name),
                serial = self.device_id.to_lowercase(),
            ),
            "bassCapabilities" => format!(
                r#"<bassCapabilities deviceID="{}"><bassAvailable>true</bassAvailable><bassMin>-9</bassMin><bassMax>0</bassMax><bassDefault>0</bassDefault></bassCapabilities>"#,
                self.device_id
            ),
            "bass" => format!(
                r#"<bass deviceID="{}"><targetbass>{}</targetbass><actualbass>{}</actualbass></bass>"#,
                self.device_id, self.bass, self.bass
            ),
            "getZone" => match &self.zone {
                Some((_, zone)) => {
                    let mut body = format!(r#"<zone master="{}">"#, escape_xml(&zone.master));
                    for member in &zone.members {
                        body.push_str(&format!("<member>{}</member>", escape_xml(member)));
                    }
                    body.push_str("</zone>");
                    body
                }
                None => "<zone />".to_string(),
            },
            _ => return errors_response(&self.device_id, "404", "HTTP_STATUS_NOT_FOUND"),
        };
        HttpResponse::new(200, body)
    }

    fn post(&mut self, action: &str, body: &str) -> HttpResponse {
        let xml = match parse_xml(body) {
            Ok(xml) => xml,
            Err(_) => return errors_response(&self.device_id, "1019", "CLIENT_XML_ERROR"),
        };
        let text = xml.get_text().map(|t| t.trim().to_string()).unwrap_or_default();

        match action {
            "key" => {
                let key = match text.parse::<KeyValue>() {
                    Ok(key) => key,
                    Err(_) => return errors_response(&self.device_id, "1005", "UNKNOWN_KEY"),
                };
                if xml.attributes.get("state").map(String::as_str) == Some("release") {
                    self.release(key);
                }
            }
            "volume" => match text.parse::<u8>() {
                Ok(volume) if volume <= 100 => self.volume = volume,
                _ => return errors_response(&self.device_id, "1019", "CLIENT_XML_ERROR"),
            },
            "select" => match ContentItem::from_element(&xml) {
                Ok(item) => {
                    self.power_on();
                    self.content = item;
                }
                Err(_) => return errors_response(&self.device_id, "1019", "CLIENT_XML_ERROR"),
            },
            "name" => self.name = text,
            "bass" => match text.parse::<i32>() {
                Ok(bass) => self.bass = bass,
                Err(_) => return errors_response(&self.device_id, "1019", "CLIENT_XML_ERROR"),
            },
            "setZone" | "addZoneSlave" | "removeZoneSlave" => {
                let master = xml.attributes.get("master").cloned().unwrap_or_default();
                let members = xml
                    .children
                    .iter()
                    .filter_map(|n| n.as_element())
                    .filter_map(|m| m.get_text().map(|t| t.to_string()))
                    .collect();
                self.zone = Some((action.to_string(), ZoneRequest { master, members }));
            }
            _ => return errors_response(&self.device_id, "404", "HTTP_STATUS_NOT_FOUND"),
        }
        status_response(action)
    }

    fn power_on(&mut self) {
        if !self.powered {
            self.powered = true;
            self.settled_at = Some(Instant::now() + self.settle_time);
        }
        self.playing = true;
    }

    fn release(&mut self, key: KeyValue) {
        match key {
            KeyValue::Power => {
                if self.powered {
                    self.powered = false;
                    self.playing = false;
                } else {
                    self.power_on();
                }
            }
            KeyValue::Mute => self.muted = !self.muted,
            KeyValue::Play => self.playing = self.powered,
            KeyValue::Pause | KeyValue::Stop => self.playing = false,
            KeyValue::PlayPause => self.playing = self.powered && !self.playing,
            KeyValue::VolumeUp => self.volume = self.volume.saturating_add(1).min(100),
            KeyValue::VolumeDown => self.volume = self.volume.saturating_sub(1),
            KeyValue::Preset1
            | KeyValue::Preset2
            | KeyValue::Preset3
            | KeyValue::Preset4
            | KeyValue::Preset5
            | KeyValue::Preset6 => {
                let index = key.as_str().trim_start_matches("PRESET_").parse::<u8>().unwrap_or(0);
                if let Some(preset) = self.presets.iter().find(|p| p.id == index) {
                    self.content = preset.content_item.clone();
                    self.power_on();
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Transport for FakeDevice {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let action = action_of(url);
        if let Some(response) = self.admit(RecordedRequest::Get { action: action.clone() })? {
            return Ok(response);
        }
        Ok(self.state.lock().get(&action))
    }

    async fn post(&self, url: &str, body: &str) -> Result<HttpResponse, HttpError> {
        let action = action_of(url);
        if let Some(response) = self.admit(RecordedRequest::Post {
            action: action.clone(),
            body: body.to_string(),
        })? {
            return Ok(response);
        }
        Ok(self.state.lock().post(&action, body))
    }
}
