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

//! Active registration set keyed by registration name.

use crate::data_plane::registration_worker::{DispatchOutcome, RegistrationWorker};
use crate::event::Event;
use crate::observability::events;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const COMPONENT: &str = "active_set";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct BroadcastSummary {
    pub(crate) queued: usize,
    pub(crate) dropped: usize,
    pub(crate) purged: usize,
}

/// name → worker map. Owned by the dispatch loop alone, so no locking.
#[derive(Default)]
pub(crate) struct ActiveRegistrations {
    workers: HashMap<String, RegistrationWorker>,
}

impl ActiveRegistrations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    /// `true` only for an entry whose worker is still running.
    pub(crate) fn contains_live(&self, name: &str) -> bool {
        self.workers
            .get(name)
            .is_some_and(|worker| !worker.is_terminated())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&RegistrationWorker> {
        self.workers.get(name)
    }

    /// Inserts a worker, returning the entry it replaced.
    pub(crate) fn insert(&mut self, worker: RegistrationWorker) -> Option<RegistrationWorker> {
        self.workers.insert(worker.name().to_string(), worker)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<RegistrationWorker> {
        self.workers.remove(name)
    }

    /// Offers the event to every worker without blocking. Full queues drop the event for
    /// that worker only; workers found terminated are removed.
    pub(crate) fn broadcast(&mut self, event: Arc<Event>) -> BroadcastSummary {
        let mut summary = BroadcastSummary::default();
        let mut terminated = Vec::new();

        for (name, worker) in &self.workers {
            match worker.dispatch(event.clone()) {
                DispatchOutcome::Queued => summary.queued += 1,
                DispatchOutcome::QueueFull => {
                    summary.dropped += 1;
                    warn!(
                        event = events::WORKER_QUEUE_FULL,
                        component = COMPONENT,
                        registration = name.as_str(),
                        worker_id = worker.worker_id(),
                        device = event.device.as_str(),
                        "worker queue full; dropping newest event"
                    );
                }
                DispatchOutcome::Terminated => terminated.push(name.clone()),
            }
        }

        for name in terminated {
            if let Some(worker) = self.workers.remove(&name) {
                summary.purged += 1;
                info!(
                    event = events::WORKER_PURGED,
                    component = COMPONENT,
                    registration = name.as_str(),
                    worker_id = worker.worker_id(),
                    "removed terminated worker from active set"
                );
            }
        }

        summary
    }

    pub(crate) fn drain(&mut self) -> Vec<RegistrationWorker> {
        self.workers.drain().map(|(_, worker)| worker).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ActiveRegistrations;
    use crate::data_plane::registration_worker::RegistrationWorker;
    use crate::test_support::{rest_registration, sample_event, StubSenderFactory};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn broadcast_reaches_every_live_worker() {
        let factory = Arc::new(StubSenderFactory::default());
        let mut active = ActiveRegistrations::new();
        for name in ["a", "b"] {
            active.insert(
                RegistrationWorker::spawn(&rest_registration(name), 8, factory.clone())
                    .expect("spawn"),
            );
        }

        let summary = active.broadcast(sample_event("devA"));

        assert_eq!(summary.queued, 2);
        factory.sender("a").wait_for(1).await;
        factory.sender("b").wait_for(1).await;
    }

    #[tokio::test]
    async fn broadcast_purges_terminated_workers() {
        let factory = Arc::new(StubSenderFactory::default());
        let mut active = ActiveRegistrations::new();
        let worker =
            RegistrationWorker::spawn(&rest_registration("gone"), 8, factory.clone()).expect("spawn");
        let queue = worker.event_sender();
        worker.reconfigure(None);
        active.insert(worker);
        active.insert(
            RegistrationWorker::spawn(&rest_registration("kept"), 8, factory.clone())
                .expect("spawn"),
        );

        tokio::time::timeout(Duration::from_secs(5), queue.closed())
            .await
            .expect("worker should exit");
        assert!(!active.contains_live("gone"));

        let summary = active.broadcast(sample_event("devA"));

        assert_eq!(summary.purged, 1);
        assert_eq!(summary.queued, 1);
        assert_eq!(active.len(), 1);
        assert!(active.get("gone").is_none());
    }

    #[tokio::test]
    async fn drain_empties_the_set() {
        let factory = Arc::new(StubSenderFactory::default());
        let mut active = ActiveRegistrations::new();
        active.insert(
            RegistrationWorker::spawn(&rest_registration("a"), 8, factory).expect("spawn"),
        );

        assert_eq!(active.drain().len(), 1);
        assert_eq!(active.len(), 0);
    }
}
