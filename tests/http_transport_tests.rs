use std::time::Duration;
use thinkchat::api::HttpTransport;
use thinkchat::config::Config;
use thinkchat::state::{ChatSession, SubmitOutcome};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Serves exactly one request: sends `head`, then each body piece with a short
/// pause, then closes. The raw request is handed back through the channel.
async fn serve_once(
    head: &'static str,
    body: Vec<&'static [u8]>,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let request = read_request(&mut socket).await;
        let _ = request_tx.send(request);

        let _ = socket.write_all(head.as_bytes()).await;
        for piece in body {
            let _ = socket.write_all(piece).await;
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let _ = socket.shutdown().await;
    });

    (format!("http://{addr}"), request_rx)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let Ok(read) = socket.read(&mut buf).await else {
            break;
        };
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..read]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn session_for(api_url: String) -> ChatSession<HttpTransport> {
    let config = Config {
        api_url,
        ..Config::default()
    };
    let transport = HttpTransport::new(&config).expect("transport builds");
    ChatSession::from_config(transport, &config)
}

const STREAM_HEAD: &str =
    "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";

#[tokio::test]
async fn test_streaming_reply_over_http() {
    let (url, request_rx) = serve_once(
        STREAM_HEAD,
        vec![
            b"{\"message\":\"<think>checking\"}\n{\"mess",
            b"age\":\"</think>Gr\xc3",
            b"\xbc\xc3\x9fe\"}\n",
        ],
    )
    .await;
    let session = session_for(url);

    let outcome = session.submit("Hello").await.expect("store stays consistent");

    assert!(matches!(
        outcome,
        SubmitOutcome::Completed {
            stream_error: None,
            ..
        }
    ));
    let turns = session.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].thinking(), Some("checking"));
    assert_eq!(turns[1].visible_response(), "Grüße");

    let request = request_rx.await.expect("server saw the request");
    assert!(request.starts_with("POST /chat/stream HTTP/1.1"));
    let body = request
        .split("\r\n\r\n")
        .nth(1)
        .expect("request carries a body");
    let json: serde_json::Value = serde_json::from_str(body).expect("body is json");
    assert_eq!(json["message"], "Hello");
    assert_eq!(json["username"], "cle");
}

#[tokio::test]
async fn test_server_error_status_rolls_back_turn() {
    let (url, _request_rx) = serve_once(
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        Vec::new(),
    )
    .await;
    let session = session_for(url);

    let outcome = session.submit("Hello").await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::RolledBack { .. }));
    assert_eq!(session.turns().len(), 1);
    assert_eq!(
        session.error_banner().as_deref(),
        Some("HTTP error! status: 500")
    );
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_stream_error_record_over_http_sets_banner() {
    let (url, _request_rx) = serve_once(
        STREAM_HEAD,
        vec![b"{\"message\":\"partial\"}\n", b"{\"error\":\"backend crashed\"}\n"],
    )
    .await;
    let session = session_for(url);

    session.submit("Hello").await.unwrap();

    assert_eq!(session.turns()[1].raw_content(), "partial");
    assert_eq!(
        session.error_banner().as_deref(),
        Some("backend crashed")
    );
}
