use futures_util::{SinkExt, StreamExt};
use racetrail_live::{ChannelConfig, ChannelHandlers, ChannelTarget, LiveSession, TransportError};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

const RACE_STATE: &str = r#"{"type":"race_state","race":{"id":"race-42","status":"running"}}"#;
const WAIT: Duration = Duration::from_secs(5);

async fn next_text(socket: &mut WebSocketStream<TcpStream>) -> Option<String> {
    while let Some(Ok(message)) = socket.next().await {
        if let Message::Text(text) = message {
            return Some(text.to_string());
        }
    }
    None
}

fn forwarding_handlers(tx: &mpsc::UnboundedSender<String>) -> ChannelHandlers {
    let (t1, t2, t3) = (tx.clone(), tx.clone(), tx.clone());
    ChannelHandlers::new()
        .on_connected(move || {
            let _ = t1.send("connected".into());
        })
        .on_race_state(move |snapshot| {
            let _ = t2.send(format!("race {} {}", snapshot.race.id, snapshot.race.status));
        })
        .on_error(move |err| {
            let label = match err {
                TransportError::Connect(_) => "connect error",
                _ => "error",
            };
            let _ = t3.send(label.into());
        })
}

async fn expect(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a handler")
        .expect("handler channel closed")
}

#[tokio::test]
async fn session_authenticates_receives_state_and_answers_pings() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let auth = next_text(&mut socket).await.unwrap();
        seen_tx.send(auth).unwrap();
        socket.send(Message::Text(RACE_STATE.into())).await.unwrap();
        socket
            .send(Message::Text(r#"{"type":"ping"}"#.into()))
            .await
            .unwrap();
        let pong = next_text(&mut socket).await.unwrap();
        seen_tx.send(pong).unwrap();
        while let Some(Ok(message)) = socket.next().await {
            if message.is_close() {
                break;
            }
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let target = ChannelTarget::new(&format!("http://{addr}"), "race-42").unwrap();
    let handle = LiveSession::start(
        target,
        Some("secret".into()),
        &ChannelConfig::default(),
        forwarding_handlers(&tx),
    )
    .unwrap();

    assert_eq!(expect(&mut rx).await, "connected");
    assert_eq!(expect(&mut rx).await, "race race-42 running");
    assert_eq!(
        expect(&mut seen_rx).await,
        r#"{"type":"auth","token":"secret"}"#
    );
    assert_eq!(expect(&mut seen_rx).await, r#"{"type":"pong"}"#);

    timeout(WAIT, handle.disconnect()).await.unwrap();
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn refused_connection_reports_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let target = ChannelTarget::new(&format!("ws://{addr}"), "race-1").unwrap();
    let handle = LiveSession::start(
        target,
        None,
        &ChannelConfig::default(),
        forwarding_handlers(&tx),
    )
    .unwrap();

    assert_eq!(expect(&mut rx).await, "connect error");
    assert!(!handle.is_finished());
    timeout(WAIT, handle.disconnect()).await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let target = ChannelTarget::new("ws://127.0.0.1:1", "race-1").unwrap();
    let config = ChannelConfig {
        reconnect_delays_ms: Vec::new(),
        ..ChannelConfig::default()
    };
    assert!(LiveSession::start(target, None, &config, ChannelHandlers::new()).is_err());
}
