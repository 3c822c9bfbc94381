//! End-to-end tests for the event stream against a local WebSocket server

use std::time::Duration;

use futures_util::SinkExt;
use soundtouch_api::DeviceEndpoint;
use soundtouch_stream::{EventStream, StreamError, StreamState};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

const SDK_INFO: &str = r#"<SoundTouchSdkInfo serverVersion="4" serverBuild="trunk r42017" />"#;
const STANDBY: &str = r#"<updates deviceID="A"><nowPlayingUpdated><nowPlaying deviceID="A" source="STANDBY"><ContentItem source="STANDBY" isPresetable="false" /></nowPlaying></nowPlayingUpdated></updates>"#;
const VOLUME: &str = r#"<updates deviceID="A"><volumeUpdated><volume><targetvolume>32</targetvolume><actualvolume>32</actualvolume><muteenabled>false</muteenabled></volume></volumeUpdated></updates>"#;

fn playing(track: &str) -> String {
    format!(
        r#"<updates deviceID="A"><nowPlayingUpdated><nowPlaying deviceID="A" source="SPOTIFY" sourceAccount="user1"><ContentItem source="SPOTIFY" type="uri" location="spotify:playlist:focus" sourceAccount="user1" isPresetable="true"><itemName>Focus</itemName></ContentItem><track>{}</track><playStatus>PLAY_STATE</playStatus></nowPlaying></nowPlayingUpdated></updates>"#,
        track
    )
}

#[derive(Debug, PartialEq)]
enum Seen {
    NowPlaying(Option<String>),
    Powered(bool),
    Playing(bool),
    Volume(u8),
}

/// Accept one client, check its subprotocol, send `frames` and then either
/// close cleanly or drop the socket
async fn serve(frames: Vec<String>, clean_close: bool) -> (u16, oneshot::Receiver<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (protocol_tx, protocol_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let callback = move |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            let requested = request
                .headers()
                .get("Sec-WebSocket-Protocol")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let _ = protocol_tx.send(requested);
            response
                .headers_mut()
                .insert("Sec-WebSocket-Protocol", HeaderValue::from_static("gabbo"));
            Ok(response)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback).await.unwrap();

        for frame in frames {
            ws.send(Message::text(frame)).await.unwrap();
        }
        if clean_close {
            let _ = ws.close(None).await;
        } else {
            drop(ws);
        }
    });

    (port, protocol_rx)
}

fn stream_for(port: u16) -> EventStream {
    let endpoint = DeviceEndpoint::new("127.0.0.1").unwrap().with_ports(8090, port);
    EventStream::new(&endpoint)
}

fn record(stream: &EventStream) -> mpsc::UnboundedReceiver<Seen> {
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = stream.dispatcher();

    let sink = tx.clone();
    dispatcher.set_now_playing_listener(move |np| {
        let _ = sink.send(Seen::NowPlaying(np.track.clone()));
    });
    let sink = tx.clone();
    dispatcher.set_powered_listener(move |on, _| {
        let _ = sink.send(Seen::Powered(on));
    });
    let sink = tx.clone();
    dispatcher.set_is_playing_listener(move |on, _| {
        let _ = sink.send(Seen::Playing(on));
    });
    dispatcher.set_volume_listener(move |actual, _| {
        let _ = tx.send(Seen::Volume(actual));
    });
    rx
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Seen>) -> Seen {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an update")
        .expect("listener channel closed")
}

#[tokio::test]
async fn test_edges_over_websocket() {
    let frames = vec![
        SDK_INFO.to_string(),
        STANDBY.to_string(),
        playing("one"),
        playing("two"),
        VOLUME.to_string(),
    ];
    let (port, protocol) = serve(frames, true).await;
    let stream = stream_for(port);
    let mut seen = record(&stream);

    let (connected_tx, connected_rx) = oneshot::channel();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<StreamError>();
    assert!(stream.start(
        move || {
            let _ = connected_tx.send(());
        },
        move |e| {
            let _ = error_tx.send(e);
        },
    ));

    tokio::time::timeout(Duration::from_secs(5), connected_rx).await.unwrap().unwrap();
    assert_eq!(protocol.await.unwrap().as_deref(), Some("gabbo"));

    // STANDBY: first message fires both edges
    assert_eq!(next(&mut seen).await, Seen::NowPlaying(None));
    assert_eq!(next(&mut seen).await, Seen::Powered(false));
    assert_eq!(next(&mut seen).await, Seen::Playing(false));

    // STANDBY -> playing: exactly one powered edge
    assert_eq!(next(&mut seen).await, Seen::NowPlaying(Some("one".to_string())));
    assert_eq!(next(&mut seen).await, Seen::Powered(true));
    assert_eq!(next(&mut seen).await, Seen::Playing(true));

    // playing -> playing with a new track: general listener only
    assert_eq!(next(&mut seen).await, Seen::NowPlaying(Some("two".to_string())));
    assert_eq!(next(&mut seen).await, Seen::Volume(32));

    // Server closed cleanly: no error, back to Disconnected
    tokio::time::timeout(Duration::from_secs(5), async {
        while stream.state() != StreamState::Disconnected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert!(error_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_dropped_connection_reports_transport_error() {
    let (port, _protocol) = serve(vec![STANDBY.to_string()], false).await;
    let stream = stream_for(port);

    let (error_tx, mut error_rx) = mpsc::unbounded_channel();
    stream.start(|| {}, move |e| {
        let _ = error_tx.send(e);
    });

    let error = tokio::time::timeout(Duration::from_secs(5), error_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(error, StreamError::Transport(_)));
    assert_eq!(stream.state(), StreamState::Disconnected);

    // Restarting is the caller's decision; a fresh start is accepted
    assert!(stream.start(|| {}, |_| {}));
    stream.stop();
}
