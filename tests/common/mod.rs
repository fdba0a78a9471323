//! Common test utilities for integration tests.
//!
//! Provides a raw TCP event stream fixture for tests that need precise
//! control over chunk boundaries (a mock HTTP server sends its body in
//! one piece), plus JSON fixture helpers.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

/// Spawn a one-shot HTTP server that answers the first connection with
/// a `text/event-stream` response whose body arrives in exactly the
/// given chunks, 30ms apart.
///
/// The body carries no Content-Length, so it is terminated by the
/// connection closing. Returns the base URL to connect to.
pub fn spawn_chunked_sse_server(chunks: Vec<&'static [u8]>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            // Drain the request head; its contents don't matter here
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);

            let head = "HTTP/1.1 200 OK\r\n\
                        Content-Type: text/event-stream\r\n\
                        Cache-Control: no-cache\r\n\
                        Connection: close\r\n\r\n";
            if stream.write_all(head.as_bytes()).is_err() {
                return;
            }
            for chunk in chunks {
                if stream.write_all(chunk).is_err() {
                    return;
                }
                let _ = stream.flush();
                thread::sleep(Duration::from_millis(30));
            }
            // Dropping the stream closes the connection and ends the body
        }
    });

    format!("http://{}", addr)
}

/// A minimal photo record as the backend would serialize it.
pub fn photo_json(id: &str, file_name: &str, state: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "file_name": file_name,
        "state": state,
    })
}
