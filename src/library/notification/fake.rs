//! In-process stand-in for a redis server accepting a single subscription

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// RESP encoding of a message published on the given channel
pub fn message_frame(topic: &str, payload: &str) -> Vec<u8> {
    format!(
        "*3\r\n$7\r\nmessage\r\n${}\r\n{}\r\n${}\r\n{}\r\n",
        topic.len(),
        topic,
        payload.len(),
        payload
    )
    .into_bytes()
}

/// Accepts one connection, confirms its `SUBSCRIBE` and writes each chunk separately with a
/// short pause in between. The connection is closed once all chunks have been written.
///
/// Returns the URL to connect to and the handle of the serving task.
pub async fn serve_subscription(
    topic: &'static str,
    chunks: Vec<Vec<u8>>,
) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("redis://{}/0", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // SUBSCRIBE <topic> is an array of two bulk strings, five lines in total
        let mut request = Vec::new();
        let mut buffer = [0u8; 256];
        while request.windows(2).filter(|line| *line == b"\r\n").count() < 5 {
            let read = socket.read(&mut buffer).await.unwrap();
            assert!(read > 0, "client hung up before subscribing");
            request.extend_from_slice(&buffer[..read]);
        }
        assert!(String::from_utf8_lossy(&request).contains(topic));

        let confirmation = format!(
            "*3\r\n$9\r\nsubscribe\r\n${}\r\n{}\r\n:1\r\n",
            topic.len(),
            topic
        );
        socket.write_all(confirmation.as_bytes()).await.unwrap();

        for chunk in chunks {
            sleep(Duration::from_millis(50)).await;
            socket.write_all(&chunk).await.unwrap();
        }
    });

    (url, handle)
}
