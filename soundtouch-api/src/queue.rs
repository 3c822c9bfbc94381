//! Serial write queue
//!
//! A key stroke is two requests the device does not treat atomically, so
//! overlapping strokes leave it in an undefined state. All mutating calls for
//! one device go through a single background task that executes them one at
//! a time, in the order received. Queries bypass the queue.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::client::SoundTouchClient;
use crate::content_item::ContentItem;
use crate::error::{ApiError, Result};
use crate::operations::{KeyValue, ZoneRequest};

/// A mutating command waiting for the worker
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedCommand {
    PressKey(KeyValue),
    Select(ContentItem),
    SetVolume(u8),
    SetName(String),
    SetBass(i32),
    SetZone(ZoneRequest),
    AddZoneSlave(ZoneRequest),
    RemoveZoneSlave(ZoneRequest),
}

impl QueuedCommand {
    fn label(&self) -> &'static str {
        match self {
            QueuedCommand::PressKey(_) => "key",
            QueuedCommand::Select(_) => "select",
            QueuedCommand::SetVolume(_) => "volume",
            QueuedCommand::SetName(_) => "name",
            QueuedCommand::SetBass(_) => "bass",
            QueuedCommand::SetZone(_) => "setZone",
            QueuedCommand::AddZoneSlave(_) => "addZoneSlave",
            QueuedCommand::RemoveZoneSlave(_) => "removeZoneSlave",
        }
    }
}

struct Job {
    command: QueuedCommand,
    reply: oneshot::Sender<Result<bool>>,
}

/// Handle to the per-device write worker
///
/// Cloning shares the worker. The worker stops once every handle is dropped.
/// Dropping the future returned by [`submit`](Self::submit) does not cancel a
/// command already handed over: the device protocol has no cancel primitive.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl CommandQueue {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(client: SoundTouchClient) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(client, receiver));
        Self { sender }
    }

    /// Enqueue a command and wait for its result
    pub async fn submit(&self, command: QueuedCommand) -> Result<bool> {
        let (reply, result) = oneshot::channel();
        self.sender
            .send(Job { command, reply })
            .map_err(|_| ApiError::QueueClosed)?;
        result.await.map_err(|_| ApiError::QueueClosed)?
    }

    pub async fn press_key(&self, key: KeyValue) -> Result<bool> {
        self.submit(QueuedCommand::PressKey(key)).await
    }

    pub async fn select_source(&self, item: ContentItem) -> Result<bool> {
        self.submit(QueuedCommand::Select(item)).await
    }

    pub async fn set_volume(&self, volume: u8) -> Result<bool> {
        self.submit(QueuedCommand::SetVolume(volume)).await
    }

    pub async fn set_name(&self, name: impl Into<String>) -> Result<bool> {
        self.submit(QueuedCommand::SetName(name.into())).await
    }

    pub async fn set_bass(&self, bass: i32) -> Result<bool> {
        self.submit(QueuedCommand::SetBass(bass)).await
    }

    pub async fn set_zone(&self, request: ZoneRequest) -> Result<bool> {
        self.submit(QueuedCommand::SetZone(request)).await
    }

    pub async fn add_zone_slave(&self, request: ZoneRequest) -> Result<bool> {
        self.submit(QueuedCommand::AddZoneSlave(request)).await
    }

    pub async fn remove_zone_slave(&self, request: ZoneRequest) -> Result<bool> {
        self.submit(QueuedCommand::RemoveZoneSlave(request)).await
    }

    /// Whether the worker is still accepting commands
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

async fn run_worker(client: SoundTouchClient, mut receiver: mpsc::UnboundedReceiver<Job>) {
    debug!(host = client.endpoint().host(), "Command worker started");

    while let Some(job) = receiver.recv().await {
        let label = job.command.label();
        trace!(action = label, "Executing queued command");

        let result = execute(&client, job.command).await;
        if job.reply.send(result).is_err() {
            trace!(action = label, "Caller went away before the command finished");
        }
    }

    debug!(host = client.endpoint().host(), "Command worker stopped");
}

async fn execute(client: &SoundTouchClient, command: QueuedCommand) -> Result<bool> {
    match command {
        QueuedCommand::PressKey(key) => client.press_key(key).await,
        QueuedCommand::Select(item) => client.select_source(&item).await,
        QueuedCommand::SetVolume(volume) => client.set_volume(volume).await,
        QueuedCommand::SetName(name) => client.set_name(&name).await,
        QueuedCommand::SetBass(bass) => client.set_bass(bass).await,
        QueuedCommand::SetZone(request) => client.set_zone(&request).await,
        QueuedCommand::AddZoneSlave(request) => client.add_zone_slave(&request).await,
        QueuedCommand::RemoveZoneSlave(request) => client.remove_zone_slave(&request).await,
    }
}
