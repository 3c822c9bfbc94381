//! WebSocket event stream
//!
//! State machine: `Disconnected -> Connecting -> Connected -> Disconnected`.
//! A closed or failed connection always lands back in `Disconnected`; the
//! stream never reconnects on its own; callers call [`EventStream::start`]
//! again when they want a new session.

use std::fmt;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use soundtouch_api::DeviceEndpoint;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::StreamConfig;
use crate::dispatcher::UpdateDispatcher;
use crate::error::{Result, StreamError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Disconnected => write!(f, "disconnected"),
            StreamState::Connecting => write!(f, "connecting"),
            StreamState::Connected => write!(f, "connected"),
        }
    }
}

#[derive(Debug)]
struct Session {
    state: StreamState,
    cancel: Option<CancellationToken>,
    /// Bumped on every start and stop so a finished reader from an older
    /// session cannot overwrite the state of a newer one
    generation: u64,
}

impl Session {
    fn finish(&mut self, generation: u64) {
        if self.generation == generation {
            self.state = StreamState::Disconnected;
            self.cancel = None;
        }
    }
}

/// Push channel of one device
pub struct EventStream {
    url: String,
    config: StreamConfig,
    dispatcher: Arc<UpdateDispatcher>,
    session: Arc<Mutex<Session>>,
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

impl EventStream {
    pub fn new(endpoint: &DeviceEndpoint) -> Self {
        Self::with_config(endpoint, StreamConfig::default())
    }

    pub fn with_config(endpoint: &DeviceEndpoint, config: StreamConfig) -> Self {
        Self {
            url: endpoint.events_url(),
            config,
            dispatcher: Arc::new(UpdateDispatcher::new()),
            session: Arc::new(Mutex::new(Session {
                state: StreamState::Disconnected,
                cancel: None,
                generation: 0,
            })),
        }
    }

    /// Dispatcher holding the listener slots
    ///
    /// Shared so a polling fallback can feed the same listeners.
    pub fn dispatcher(&self) -> Arc<UpdateDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn state(&self) -> StreamState {
        self.session.lock().state
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the connection on a background task
    ///
    /// `on_connect` runs once the handshake completes. `on_error` runs when
    /// the handshake fails or an established connection errors; either way
    /// the stream ends up `Disconnected`. Returns `false` without doing
    /// anything unless the stream is currently `Disconnected`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<C, E>(&self, on_connect: C, on_error: E) -> bool
    where
        C: FnOnce() + Send + 'static,
        E: Fn(StreamError) + Send + Sync + 'static,
    {
        let (cancel, generation) = {
            let mut session = self.session.lock();
            if session.state != StreamState::Disconnected {
                debug!(url = %self.url, state = %session.state, "Event stream already active");
                return false;
            }
            let cancel = CancellationToken::new();
            session.state = StreamState::Connecting;
            session.cancel = Some(cancel.clone());
            session.generation += 1;
            (cancel, session.generation)
        };

        let reader = Reader {
            url: self.url.clone(),
            config: self.config.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            session: Arc::clone(&self.session),
            generation,
            cancel,
        };
        tokio::spawn(reader.run(on_connect, on_error));
        true
    }

    /// Close the connection
    ///
    /// Listeners stay installed. No error callback fires for a requested stop.
    pub fn stop(&self) {
        let mut session = self.session.lock();
        if let Some(cancel) = session.cancel.take() {
            cancel.cancel();
        }
        if session.state != StreamState::Disconnected {
            info!(url = %self.url, "Event stream stopped");
        }
        session.state = StreamState::Disconnected;
        session.generation += 1;
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(cancel) = self.session.lock().cancel.take() {
            cancel.cancel();
        }
    }
}

struct Reader {
    url: String,
    config: StreamConfig,
    dispatcher: Arc<UpdateDispatcher>,
    session: Arc<Mutex<Session>>,
    generation: u64,
    cancel: CancellationToken,
}

impl Reader {
    async fn run<C, E>(self, on_connect: C, on_error: E)
    where
        C: FnOnce() + Send + 'static,
        E: Fn(StreamError) + Send + Sync + 'static,
    {
        debug!(url = %self.url, "Connecting event stream");

        let connected = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.session.lock().finish(self.generation);
                return;
            }
            result = connect(&self.url, &self.config) => result,
        };

        let socket = match connected {
            Ok(socket) => socket,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Event stream connection failed");
                self.session.lock().finish(self.generation);
                on_error(e);
                return;
            }
        };

        {
            let mut session = self.session.lock();
            if session.generation != self.generation {
                return;
            }
            session.state = StreamState::Connected;
        }
        info!(url = %self.url, "Event stream connected");
        on_connect();

        let outcome = self.read(socket).await;
        self.session.lock().finish(self.generation);

        match outcome {
            Ok(()) => debug!(url = %self.url, "Event stream closed"),
            Err(e) => {
                warn!(url = %self.url, error = %e, "Event stream failed");
                on_error(e);
            }
        }
    }

    async fn read(&self, socket: Socket) -> Result<()> {
        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    if let Err(e) = write.close().await {
                        trace!(error = %e, "Close handshake failed");
                    }
                    return Ok(());
                }
                frame = read.next() => match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        trace!(len = text.len(), "Update frame received");
                        self.dispatcher.handle_frame(text.as_str());
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(frame) = frame {
                            debug!(code = %frame.code, reason = %frame.reason, "Close frame received");
                        }
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Ping, pong and binary frames carry no updates
                    }
                    Some(Err(e)) => return Err(StreamError::Transport(e.to_string())),
                    None => return Ok(()),
                },
            }
        }
    }
}

async fn connect(url: &str, config: &StreamConfig) -> Result<Socket> {
    let uri: tungstenite::http::Uri = url
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| StreamError::Connect(e.to_string()))?;
    let request = ClientRequestBuilder::new(uri).with_sub_protocol(config.sub_protocol.clone());

    let (socket, _response) =
        tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(request))
            .await
            .map_err(|_| {
                StreamError::Connect(format!("Handshake timed out after {:?}", config.connect_timeout))
            })?
            .map_err(|e| StreamError::Connect(e.to_string()))?;

    Ok(socket)
}
