use std::sync::Arc;

use http_client::{HttpClient, HttpResponse, Transport};
use tracing::{debug, warn};
use xmltree::Element;

use crate::content_item::ContentItem;
use crate::endpoint::DeviceEndpoint;
use crate::error::{ApiError, Result};
use crate::operation::{rejection_reason, DeviceCommand, DeviceQuery};
use crate::operations::{
    AddZoneSlaveCommand, Bass, BassCapabilities, BassCapabilitiesQuery, BassQuery, Info,
    InfoQuery, KeyCommand, KeyRequest, KeyState, KeyValue, NowPlaying, NowPlayingQuery, Preset,
    PresetsQuery, RemoveZoneSlaveCommand, SelectCommand, SetBassCommand, SetNameCommand,
    SetVolumeCommand, SetZoneCommand, SourceItem, SourcesQuery, TrackInfoQuery, Volume,
    VolumeQuery, Zone, ZoneQuery, ZoneRequest,
};

/// A client for issuing queries and commands to one SoundTouch device
///
/// This bridges the stateless operation definitions and the network. It does
/// not retry and does not serialize anything: concurrent `press_key` calls on
/// the same device must be funneled through a [`CommandQueue`](crate::CommandQueue).
///
/// ```rust,ignore
/// use soundtouch_api::{DeviceEndpoint, SoundTouchClient};
///
/// let client = SoundTouchClient::new(DeviceEndpoint::new("192.168.1.20")?);
/// let now_playing = client.get_now_playing().await?;
/// if now_playing.is_standby() {
///     client.power().await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SoundTouchClient {
    endpoint: DeviceEndpoint,
    transport: Arc<dyn Transport>,
}

impl SoundTouchClient {
    /// Create a client backed by the HTTP transport
    pub fn new(endpoint: DeviceEndpoint) -> Self {
        Self::with_transport(endpoint, Arc::new(HttpClient::new()))
    }

    /// Create a client with a custom transport
    pub fn with_transport(endpoint: DeviceEndpoint, transport: Arc<dyn Transport>) -> Self {
        Self { endpoint, transport }
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// GET `/{action}` and parse the document
    ///
    /// An `<errors>` document is reported as [`ApiError::Rejected`].
    pub async fn query(&self, action: &str) -> Result<Element> {
        let url = self.endpoint.command_url(action);
        debug!(action, url = %url, "Sending query");

        let response = self.transport.get(&url).await?;
        let xml = parse_body(action, &response)?;

        if xml.name == "errors" {
            return Err(ApiError::Rejected {
                action: action.to_string(),
                reason: rejection_reason(&xml),
            });
        }
        if !response.is_success() {
            return Err(ApiError::Protocol(format!(
                "'{}' returned HTTP {} with <{}>",
                action, response.status, xml.name
            )));
        }
        Ok(xml)
    }

    /// POST `body` to `/{action}` and parse the reply
    ///
    /// The reply is returned as-is, `<status>` and `<errors>` alike; use
    /// [`send`](Self::send) for the accepted/rejected interpretation.
    pub async fn command(&self, action: &str, body: &str) -> Result<Element> {
        let url = self.endpoint.command_url(action);
        debug!(action, url = %url, body, "Sending command");

        let response = self.transport.post(&url, body).await?;
        parse_body(action, &response)
    }

    /// Execute a typed query
    pub async fn execute<Q: DeviceQuery>(&self) -> Result<Q::Response> {
        let xml = self.query(Q::ACTION).await?;
        Q::parse_response(&xml)
    }

    /// Execute a typed command
    ///
    /// Returns `Ok(false)` when the device answers with `<errors>`: a rejected
    /// command is logged and reported, never raised.
    pub async fn send<C: DeviceCommand>(&self, request: &C::Request) -> Result<bool> {
        let body = C::build_payload(request);
        let xml = self.command(C::ACTION, &body).await?;

        if xml.name == "errors" {
            warn!(
                action = C::ACTION,
                host = self.endpoint.host(),
                reason = %rejection_reason(&xml),
                "Device rejected command"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Press and release `key`
    ///
    /// The release is sent only after the press is accepted, and always once
    /// the press is accepted. Returns true only if both halves are accepted.
    pub async fn press_key(&self, key: KeyValue) -> Result<bool> {
        debug!(key = %key, host = self.endpoint.host(), "Pressing key");

        let press = KeyRequest { key, state: KeyState::Press };
        if !self.send::<KeyCommand>(&press).await? {
            return Ok(false);
        }

        let release = KeyRequest { key, state: KeyState::Release };
        self.send::<KeyCommand>(&release).await
    }

    /// Select a content item directly
    pub async fn select_source(&self, item: &ContentItem) -> Result<bool> {
        debug!(source = %item.source, account = ?item.source_account, "Selecting content item");
        self.send::<SelectCommand>(item).await
    }

    pub async fn set_volume(&self, volume: u8) -> Result<bool> {
        if volume > 100 {
            return Err(ApiError::InvalidParameter(format!(
                "Volume must be 0..=100, got {}",
                volume
            )));
        }
        self.send::<SetVolumeCommand>(&volume).await
    }

    pub async fn set_name(&self, name: &str) -> Result<bool> {
        self.send::<SetNameCommand>(&name.to_string()).await
    }

    pub async fn set_bass(&self, bass: i32) -> Result<bool> {
        self.send::<SetBassCommand>(&bass).await
    }

    pub async fn set_zone(&self, request: &ZoneRequest) -> Result<bool> {
        self.send::<SetZoneCommand>(request).await
    }

    pub async fn add_zone_slave(&self, request: &ZoneRequest) -> Result<bool> {
        self.send::<AddZoneSlaveCommand>(request).await
    }

    pub async fn remove_zone_slave(&self, request: &ZoneRequest) -> Result<bool> {
        self.send::<RemoveZoneSlaveCommand>(request).await
    }

    pub async fn play(&self) -> Result<bool> {
        self.press_key(KeyValue::Play).await
    }

    pub async fn pause(&self) -> Result<bool> {
        self.press_key(KeyValue::Pause).await
    }

    pub async fn stop(&self) -> Result<bool> {
        self.press_key(KeyValue::Stop).await
    }

    pub async fn play_pause(&self) -> Result<bool> {
        self.press_key(KeyValue::PlayPause).await
    }

    /// Toggle power
    pub async fn power(&self) -> Result<bool> {
        self.press_key(KeyValue::Power).await
    }

    pub async fn get_now_playing(&self) -> Result<NowPlaying> {
        self.execute::<NowPlayingQuery>().await
    }

    pub async fn get_track_info(&self) -> Result<NowPlaying> {
        self.execute::<TrackInfoQuery>().await
    }

    pub async fn get_volume(&self) -> Result<Volume> {
        self.execute::<VolumeQuery>().await
    }

    pub async fn get_presets(&self) -> Result<Vec<Preset>> {
        self.execute::<PresetsQuery>().await
    }

    pub async fn get_sources(&self) -> Result<Vec<SourceItem>> {
        self.execute::<SourcesQuery>().await
    }

    pub async fn get_info(&self) -> Result<Info> {
        self.execute::<InfoQuery>().await
    }

    pub async fn get_bass_capabilities(&self) -> Result<BassCapabilities> {
        self.execute::<BassCapabilitiesQuery>().await
    }

    pub async fn get_bass(&self) -> Result<Bass> {
        self.execute::<BassQuery>().await
    }

    pub async fn get_zone(&self) -> Result<Zone> {
        self.execute::<ZoneQuery>().await
    }

    /// Whether the device is out of standby
    pub async fn is_powered_on(&self) -> Result<bool> {
        Ok(!self.get_now_playing().await?.is_standby())
    }

    /// Whether the device is powered and actively playing
    pub async fn is_alive(&self) -> Result<bool> {
        let now_playing = self.get_now_playing().await?;
        Ok(!now_playing.is_standby() && now_playing.is_playing())
    }
}

fn parse_body(action: &str, response: &HttpResponse) -> Result<Element> {
    response.xml().map_err(|e| {
        ApiError::Protocol(format!(
            "'{}' returned HTTP {} with an unreadable body: {}",
            action, response.status, e
        ))
    })
}
