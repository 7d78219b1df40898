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

//! TCP listeners feeding newline-delimited JSON into the dispatch loop channels.

use export_distro::ingress::{decode_lines, Inbound};
use export_distro::observability::events;
use tokio::net::TcpListener;
use tokio::sync::mpsc::Sender;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "ingress_listener";

/// Accepts connections until `shutdown` fires. Each connection is decoded on its own
/// task into `sink`.
pub(crate) fn serve<T, U>(
    stream: &'static str,
    listener: TcpListener,
    sink: Sender<U>,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    T: Inbound,
    U: From<T> + Send + 'static,
{
    tokio::spawn(async move {
        if let Ok(address) = listener.local_addr() {
            info!(
                event = events::INGRESS_LISTENING,
                component = COMPONENT,
                stream,
                address = %address,
                "accepting connections"
            );
        }

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            let (socket, peer) = match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(
                        event = events::INGRESS_ACCEPT_FAILED,
                        component = COMPONENT,
                        stream,
                        err = %err,
                        "accept failed"
                    );
                    continue;
                }
            };

            debug!(
                event = events::INGRESS_CONNECTION_ACCEPTED,
                component = COMPONENT,
                stream,
                peer = %peer,
                "connection accepted"
            );

            let sink = sink.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let source = format!("{stream}:{peer}");
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    result = decode_lines::<_, T, U>(socket, &sink, &source) => {
                        if let Err(err) = result {
                            warn!(
                                event = events::INGRESS_READ_FAILED,
                                component = COMPONENT,
                                stream,
                                peer = %peer,
                                err = %err,
                                "connection read failed"
                            );
                        }
                    }
                }
            });
        }
    })
}

/// Logs a listener task that panicked or was cancelled. Returns whether it ended cleanly.
pub(crate) fn report_exit(stream: &'static str, joined: Result<(), JoinError>) -> bool {
    match joined {
        Ok(()) => true,
        Err(err) => {
            error!(
                event = events::INGRESS_LISTENER_FAILED,
                component = COMPONENT,
                stream,
                panicked = err.is_panic(),
                err = %err,
                "ingress listener did not exit cleanly"
            );
            false
        }
    }
}
