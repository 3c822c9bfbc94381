//! Polling fallback
//!
//! For devices whose event port is unreachable. Queries `now_playing` and
//! `volume` on a fixed interval and feeds the results through the same
//! [`UpdateDispatcher`] the WebSocket reader uses, so listeners see the same
//! edge semantics either way. Failed polls back off exponentially and the
//! task only ends when cancelled.

use std::sync::Arc;

use soundtouch_api::SoundTouchClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::PollingConfig;
use crate::dispatcher::UpdateDispatcher;
use crate::error::Result;
use crate::updates::DeviceUpdate;

/// Handle to a running poll loop
#[derive(Debug)]
pub struct PollingTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PollingTask {
    /// Spawn the poll loop; the first poll happens immediately
    pub fn start(
        client: SoundTouchClient,
        dispatcher: Arc<UpdateDispatcher>,
        config: PollingConfig,
    ) -> Self {
        Self::start_with_token(client, dispatcher, config, CancellationToken::new())
    }

    /// Like [`start`](Self::start), stopped when `cancel` is cancelled
    pub fn start_with_token(
        client: SoundTouchClient,
        dispatcher: Arc<UpdateDispatcher>,
        config: PollingConfig,
        cancel: CancellationToken,
    ) -> Self {
        let handle = tokio::spawn(poll_loop(client, dispatcher, config, cancel.clone()));
        Self { cancel, handle: Some(handle) }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop and wait for the loop to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Polling task ended abnormally");
            }
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    client: SoundTouchClient,
    dispatcher: Arc<UpdateDispatcher>,
    config: PollingConfig,
    cancel: CancellationToken,
) {
    let host = client.endpoint().host().to_string();
    debug!(host = %host, interval = ?config.interval, "Polling started");

    let mut failures: u32 = 0;
    loop {
        match poll_once(&client, &dispatcher).await {
            Ok(()) => {
                if failures > 0 {
                    debug!(host = %host, failures, "Polling recovered");
                }
                failures = 0;
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                warn!(
                    host = %host,
                    error = %e,
                    failures,
                    retry_in = ?config.delay_after(failures),
                    "Poll failed"
                );
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.delay_after(failures)) => {}
        }
    }

    debug!(host = %host, "Polling stopped");
}

async fn poll_once(client: &SoundTouchClient, dispatcher: &UpdateDispatcher) -> Result<()> {
    let now_playing = client.get_now_playing().await?;
    dispatcher.dispatch(DeviceUpdate::NowPlaying(now_playing));

    let volume = client.get_volume().await?;
    dispatcher.dispatch(DeviceUpdate::Volume(volume));
    Ok(())
}
