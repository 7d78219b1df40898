/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// One HTTP request as seen by [`HttpStub`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Minimal HTTP/1.1 endpoint on localhost that answers every request with one status
/// code and captures what it received.
pub struct HttpStub {
    addr: SocketAddr,
    requests: Mutex<mpsc::UnboundedReceiver<CapturedRequest>>,
    accept_task: JoinHandle<()>,
}

impl HttpStub {
    pub async fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub listener should bind");
        let addr = listener
            .local_addr()
            .expect("stub listener should have an address");
        let (tx, rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(stream, status, tx.clone()));
            }
        });

        Self {
            addr,
            requests: Mutex::new(rx),
            accept_task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn wait_for_request(&self, timeout: Duration) -> Option<CapturedRequest> {
        let mut requests = self.requests.lock().await;
        tokio::time::timeout(timeout, requests.recv())
            .await
            .ok()
            .flatten()
    }
}

impl Drop for HttpStub {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_connection(
    stream: TcpStream,
    status: u16,
    requests: mpsc::UnboundedSender<CapturedRequest>,
) {
    let mut reader = BufReader::new(stream);

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        let mut parts = request_line.split_whitespace();
        let mut request = CapturedRequest {
            method: parts.next().unwrap_or_default().to_string(),
            path: parts.next().unwrap_or_default().to_string(),
            ..Default::default()
        };

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                let (key, value) = (key.trim().to_string(), value.trim().to_string());
                if key.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap_or(0);
                }
                request.headers.push((key, value));
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }
        request.body = body;
        let _ = requests.send(request);

        let response = format!("HTTP/1.1 {status} Stub\r\ncontent-length: 0\r\n\r\n");
        if reader.get_mut().write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}
