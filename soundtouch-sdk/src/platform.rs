//! All configured accessories and their update feeds

use std::sync::Arc;

use soundtouch_api::SoundTouchClient;
use soundtouch_state::logging::LoggingMode;
use soundtouch_stream::{EventStream, PollingConfig, PollingTask, StreamState, UpdateDispatcher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accessory::SoundTouchAccessory;
use crate::config::{AccessoryConfig, PlatformConfig};
use crate::device::SoundTouchDevice;
use crate::error::Result;
use crate::host::EntityHost;

#[derive(Debug)]
pub struct SoundTouchPlatform {
    accessories: Vec<SoundTouchAccessory>,
    streams: Vec<Arc<EventStream>>,
    watchdogs: Vec<JoinHandle<()>>,
    polling: PollingConfig,
    cancel: CancellationToken,
}

impl SoundTouchPlatform {
    /// Build one accessory per configured device
    ///
    /// `host_factory` supplies the entity host for each accessory. The first
    /// device that cannot be reached or configured fails the whole platform.
    pub async fn from_config<F>(config: &PlatformConfig, host_factory: F) -> Result<Self>
    where
        F: Fn(&AccessoryConfig) -> Arc<dyn EntityHost>,
    {
        if config.discover_all_accessories == Some(true) {
            warn!("discoverAllAccessories is set but discovery is not supported, using configured accessories only");
        }

        let mut accessories = Vec::with_capacity(config.accessories.len());
        for accessory_config in &config.accessories {
            let device = SoundTouchDevice::from_config(&config.global, accessory_config).await?;
            let host = host_factory(accessory_config);
            accessories.push(SoundTouchAccessory::new(device, host.as_ref())?);
        }
        info!(accessories = accessories.len(), "Platform ready");

        Ok(Self::with_accessories(accessories))
    }

    pub fn with_accessories(accessories: Vec<SoundTouchAccessory>) -> Self {
        Self {
            accessories,
            streams: Vec::new(),
            watchdogs: Vec::new(),
            polling: PollingConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Polling used for devices whose event stream is unavailable
    ///
    /// The interval is also how often each stream is checked.
    pub fn with_polling_config(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn accessories(&self) -> &[SoundTouchAccessory] {
        &self.accessories
    }

    pub fn accessory(&self, name: &str) -> Option<&SoundTouchAccessory> {
        self.accessories.iter().find(|accessory| accessory.name() == name)
    }

    /// Publish the current state, then follow each device's event stream
    ///
    /// A device that cannot be refreshed is logged and still subscribed. Once
    /// a stream fails to connect or ends, that device is polled instead until
    /// [`stop`](Self::stop).
    pub async fn start(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        for accessory in &self.accessories {
            if let Err(e) = accessory.refresh().await {
                warn!(device = %accessory.name(), error = %e, "Initial refresh failed");
            }

            let stream = Arc::new(EventStream::new(accessory.device().client().endpoint()));
            accessory.attach_event_stream(&stream);

            let connected = accessory.name().to_string();
            let failed = connected.clone();
            stream.start(
                move || info!(device = %connected, "Event stream connected"),
                move |e| warn!(device = %failed, error = %e, "Event stream stopped"),
            );

            self.watchdogs.push(tokio::spawn(watch_stream(
                accessory.name().to_string(),
                Arc::clone(&stream),
                accessory.device().client().clone(),
                self.polling.clone(),
                self.cancel.child_token(),
            )));
            self.streams.push(stream);
        }
    }

    pub fn streams(&self) -> &[Arc<EventStream>] {
        &self.streams
    }

    /// Close every stream and end any polling fallback
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.watchdogs.clear();
        for stream in self.streams.drain(..) {
            stream.stop();
        }
    }
}

/// Wait for the stream to drop out, then poll into its dispatcher
///
/// Polling feeds the stream's own dispatcher so edge detection carries over
/// from whatever the stream already delivered.
async fn watch_stream(
    name: String,
    stream: Arc<EventStream>,
    client: SoundTouchClient,
    config: PollingConfig,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.interval) => {}
        }
        if stream.state() == StreamState::Disconnected {
            break;
        }
    }

    warn!(device = %name, interval = ?config.interval, "Event stream unavailable, polling instead");
    let dispatcher: Arc<UpdateDispatcher> = stream.dispatcher();
    drop(stream);

    let polling = PollingTask::start_with_token(client, dispatcher, config, cancel.clone());
    cancel.cancelled().await;
    polling.shutdown().await;
    debug!(device = %name, "Polling fallback stopped");
}

/// Log rendering for a configuration: debug output when anything is verbose
pub fn logging_mode(config: &PlatformConfig) -> LoggingMode {
    let verbose = config.global.verbose == Some(true)
        || config
            .accessories
            .iter()
            .any(|accessory| accessory.is_verbose(&config.global));
    LoggingMode::for_verbosity(verbose)
}
