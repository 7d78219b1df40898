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

use export_distro::{
    DistroConfig, DistroError, Event, ExportDistro, NotifyUpdate, RegistrationRegistry,
    SenderFactory,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) const WAIT: Duration = Duration::from_secs(5);

pub(crate) fn test_config(event_queue_size: usize) -> DistroConfig {
    DistroConfig {
        event_queue_size,
        registry_retry_interval: Duration::from_millis(10),
        shutdown_grace: Duration::from_millis(500),
        http_timeout: Duration::from_secs(2),
    }
}

/// A dispatch loop running on its own task plus the channels that feed it.
pub(crate) struct RunningDistro {
    pub(crate) events: mpsc::Sender<Arc<Event>>,
    pub(crate) notifications: mpsc::Sender<NotifyUpdate>,
    pub(crate) shutdown: CancellationToken,
    task: JoinHandle<Result<(), DistroError>>,
}

impl RunningDistro {
    pub(crate) async fn publish(&self, event: Arc<Event>) {
        self.events
            .send(event)
            .await
            .expect("dispatch loop should accept events");
    }

    #[allow(dead_code)]
    pub(crate) async fn notify(&self, update: NotifyUpdate) {
        self.notifications
            .send(update)
            .await
            .expect("dispatch loop should accept notifications");
        // let the loop apply it before anything queued after it
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    pub(crate) async fn stop(self) -> Result<(), DistroError> {
        self.shutdown.cancel();
        tokio::time::timeout(WAIT, self.task)
            .await
            .expect("dispatch loop should stop in time")
            .expect("dispatch loop should not panic")
    }
}

pub(crate) fn start_distro(
    name: &str,
    config: DistroConfig,
    registry: Arc<dyn RegistrationRegistry>,
    sender_factory: Arc<dyn SenderFactory>,
) -> RunningDistro {
    let (events, upstream) = mpsc::channel(64);
    let (notifications, notify_rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();

    let distro = ExportDistro::new(name, config, registry).with_sender_factory(sender_factory);
    let task = tokio::spawn(distro.run(upstream, notify_rx, shutdown.clone()));

    RunningDistro {
        events,
        notifications,
        shutdown,
        task,
    }
}
