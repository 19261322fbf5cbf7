//! Tokio driver: runs a [`LiveChannel`] over `tokio-tungstenite` sockets.
use futures_util::{SinkExt, StreamExt};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::channel::{
    ChannelConfig, ChannelConfigError, ChannelHandlers, ConnectionId, Connector, LiveChannel,
    Transport, TransportEvent,
};
use crate::error::TransportError;
use crate::target::ChannelTarget;

type EventSender = mpsc::UnboundedSender<(ConnectionId, TransportEvent)>;

/// Opens one socket task per connection attempt.
#[derive(Debug, Clone)]
pub struct WsConnector {
    events: EventSender,
}

impl WsConnector {
    #[must_use]
    pub const fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn open(&mut self, id: ConnectionId, url: &Url) -> Result<WsTransport, TransportError> {
        let (outgoing, queued) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(id, url.to_string(), queued, self.events.clone()));
        Ok(WsTransport {
            outgoing: Some(outgoing),
        })
    }
}

/// Handle on a socket task. Closing or dropping it makes the task send a
/// close frame and exit.
#[derive(Debug)]
pub struct WsTransport {
    outgoing: Option<mpsc::UnboundedSender<String>>,
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let Some(outgoing) = self.outgoing.as_ref() else {
            return Err(TransportError::Send("transport closed".to_string()));
        };
        outgoing
            .send(text)
            .map_err(|_| TransportError::Send("socket task has stopped".to_string()))
    }

    fn close(&mut self) {
        self.outgoing = None;
    }
}

async fn run_socket(
    id: ConnectionId,
    url: String,
    mut queued: mpsc::UnboundedReceiver<String>,
    events: EventSender,
) {
    let report = |event: TransportEvent| {
        // The channel may already be gone; nothing left to tell.
        let _ = events.send((id, event));
    };

    let mut socket = match connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(err) => {
            report(TransportEvent::Failed(TransportError::Connect(err.to_string())));
            return;
        }
    };
    report(TransportEvent::Opened);

    loop {
        tokio::select! {
            outbound = queued.recv() => match outbound {
                Some(text) => {
                    if let Err(err) = socket.send(Message::Text(text)).await {
                        report(TransportEvent::Failed(TransportError::Send(err.to_string())));
                        return;
                    }
                }
                None => {
                    if let Err(err) = socket.close(None).await {
                        log::debug!("close handshake for connection {id} failed: {err}");
                    }
                    return;
                }
            },
            inbound = socket.next() => match inbound {
                Some(Ok(Message::Text(text))) => report(TransportEvent::Frame(text)),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame.map_or((None, String::new()), |frame| {
                        (Some(u16::from(frame.code)), frame.reason.to_string())
                    });
                    report(TransportEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    report(TransportEvent::Failed(TransportError::Protocol(err.to_string())));
                    return;
                }
                None => {
                    report(TransportEvent::Closed {
                        code: None,
                        reason: "stream ended".to_string(),
                    });
                    return;
                }
            },
        }
    }
}

#[derive(Debug)]
enum Control {
    Disconnect(oneshot::Sender<()>),
}

/// Entry point for running a channel on the current tokio runtime.
#[derive(Debug)]
pub struct LiveSession;

impl LiveSession {
    /// Spawn the channel task and start connecting to `target`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn start(
        target: ChannelTarget,
        auth_token: Option<String>,
        config: &ChannelConfig,
        handlers: ChannelHandlers,
    ) -> Result<SessionHandle, ChannelConfigError> {
        config.validate()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let channel = LiveChannel::new(WsConnector::new(events_tx), config, handlers);
        log::info!("starting live session for race {}", target.race_id());
        let task = tokio::spawn(drive(channel, target, auth_token, events_rx, control_rx));
        Ok(SessionHandle {
            control: control_tx,
            task: Some(task),
        })
    }
}

async fn drive(
    mut channel: LiveChannel<WsConnector>,
    target: ChannelTarget,
    auth_token: Option<String>,
    mut events: mpsc::UnboundedReceiver<(ConnectionId, TransportEvent)>,
    mut control: mpsc::UnboundedReceiver<Control>,
) {
    channel.connect(target, auth_token, Instant::now());
    loop {
        let deadline = channel.next_deadline();
        tokio::select! {
            Some((id, event)) = events.recv() => channel.handle_event(id, event, Instant::now()),
            command = control.recv() => {
                channel.disconnect();
                if let Some(Control::Disconnect(done)) = command {
                    let _ = done.send(());
                }
                return;
            }
            () = sleep_until(deadline) => channel.poll_timers(Instant::now()),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Scoped ownership of a running session. [`Self::disconnect`] or dropping
/// the handle tears the connection down; no handler fires afterwards.
#[derive(Debug)]
pub struct SessionHandle {
    control: mpsc::UnboundedSender<Control>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Disconnect and wait for the session task to finish.
    pub async fn disconnect(mut self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.control.send(Control::Disconnect(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            log::debug!("live session task ended abnormally: {err}");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
