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

//! Newline-delimited JSON decoding for the upstream event and notification streams.
//!
//! Malformed messages are logged and dropped here so the dispatch loop only ever sees
//! well-formed values. Framing works on raw bytes: a line that is not UTF-8 or is longer
//! than the frame limit costs that line only, never the connection.

use crate::error::IngressError;
use crate::event::Event;
use crate::observability::events;
use crate::registration::NotifyUpdate;
use bytes::{Buf, BytesMut};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::{cmp, io};
use tokio::io::AsyncRead;
use tokio::sync::mpsc::Sender;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{info, warn};

const COMPONENT: &str = "ingress";

/// Longest line accepted on an ingress stream, newline excluded.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// A message type accepted on an ingress stream.
pub trait Inbound: DeserializeOwned + Send + 'static {
    /// Semantic checks beyond JSON shape.
    fn validate(&self) -> Result<(), IngressError> {
        Ok(())
    }
}

impl Inbound for Event {
    fn validate(&self) -> Result<(), IngressError> {
        if self.device.is_empty() {
            return Err(IngressError::Invalid("event has no device".to_string()));
        }
        if self.readings.is_empty() {
            return Err(IngressError::Invalid(format!(
                "event from {} has no readings",
                self.device
            )));
        }
        Ok(())
    }
}

impl Inbound for NotifyUpdate {
    fn validate(&self) -> Result<(), IngressError> {
        if self.name.is_empty() {
            return Err(IngressError::Invalid(
                "notification has no registration name".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn decode_line<T: Inbound>(line: &[u8]) -> Result<T, IngressError> {
    let value: T = serde_json::from_slice(line)?;
    value.validate()?;
    Ok(value)
}

#[derive(Debug, PartialEq)]
enum Frame {
    Line(BytesMut),
    Oversize,
}

/// Splits on `\n` without interpreting the bytes. Lines over `max_len` are skipped up to
/// their terminating newline and reported once as [`Frame::Oversize`].
struct LineFramer {
    max_len: usize,
    // Bytes before this offset are known to hold no newline.
    next_index: usize,
    discarding: bool,
}

impl LineFramer {
    fn new(max_len: usize) -> Self {
        LineFramer {
            max_len,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for LineFramer {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        loop {
            let read_to = cmp::min(self.max_len.saturating_add(1), buf.len());
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|byte| *byte == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                    return Ok(Some(Frame::Oversize));
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let mut line = buf.split_to(end + 1);
                    line.truncate(end);
                    return Ok(Some(Frame::Line(line)));
                }
                (false, None) if buf.len() > self.max_len => {
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        if self.discarding {
            self.discarding = false;
            buf.clear();
            return Ok(Some(Frame::Oversize));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(Frame::Line(buf.split())))
    }
}

/// Reads `reader` to the end, forwarding every valid line to `sink`.
///
/// Returns how many values were forwarded. Stops early when `sink` is closed.
pub async fn decode_lines<R, T, U>(
    reader: R,
    sink: &Sender<U>,
    source: &str,
) -> Result<usize, IngressError>
where
    R: AsyncRead + Unpin,
    T: Inbound,
    U: From<T>,
{
    decode_lines_with_limit::<R, T, U>(reader, sink, source, MAX_LINE_BYTES).await
}

/// [`decode_lines`] with an explicit frame limit.
pub async fn decode_lines_with_limit<R, T, U>(
    reader: R,
    sink: &Sender<U>,
    source: &str,
    max_line_bytes: usize,
) -> Result<usize, IngressError>
where
    R: AsyncRead + Unpin,
    T: Inbound,
    U: From<T>,
{
    let mut frames = FramedRead::new(reader, LineFramer::new(max_line_bytes));
    let mut forwarded = 0;
    let mut line_no: u64 = 0;

    while let Some(frame) = frames.next().await {
        line_no += 1;
        let line = match frame? {
            Frame::Line(line) => line,
            Frame::Oversize => {
                warn!(
                    event = events::INGRESS_DECODE_FAILED,
                    component = COMPONENT,
                    source,
                    line_no,
                    max_line_bytes,
                    "dropping oversized message"
                );
                continue;
            }
        };
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let value = match decode_line::<T>(&line) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    event = events::INGRESS_DECODE_FAILED,
                    component = COMPONENT,
                    source,
                    line_no,
                    err = %err,
                    "dropping undecodable message"
                );
                continue;
            }
        };

        if sink.send(U::from(value)).await.is_err() {
            warn!(
                event = events::INGRESS_FORWARD_FAILED,
                component = COMPONENT,
                source,
                line_no,
                "downstream closed; stopping ingress"
            );
            return Ok(forwarded);
        }
        forwarded += 1;
    }

    info!(
        event = events::INGRESS_CLOSED,
        component = COMPONENT,
        source,
        forwarded,
        "ingress stream ended"
    );
    Ok(forwarded)
}
