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

//! Registration worker: one task per registration running its pipeline.

use crate::error::CompileError;
use crate::event::Event;
use crate::observability::{
    events,
    fields::{self, WorkerContext},
};
use crate::pipeline::sender::SenderFactory;
use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::registration::Registration;
use crate::runtime::worker_runtime::spawn_registration_loop;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{
    self, error::TrySendError, Receiver, Sender, UnboundedReceiver, UnboundedSender,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};
use uuid::Uuid;

const COMPONENT: &str = "registration_worker";

/// Result of handing one event to a worker queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DispatchOutcome {
    Queued,
    /// The bounded queue is full; the event was dropped for this worker only.
    QueueFull,
    Terminated,
}

#[derive(Debug, Default)]
pub(crate) struct WorkerStats {
    received: AtomicU64,
    filtered: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of a worker's counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WorkerStatsSnapshot {
    pub received: u64,
    pub filtered: u64,
    pub sent: u64,
    pub failed: u64,
}

impl WorkerStats {
    pub(crate) fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &PipelineOutcome) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            PipelineOutcome::Filtered => &self.filtered,
            PipelineOutcome::Sent => &self.sent,
            PipelineOutcome::TransformFailed(_) | PipelineOutcome::SendFailed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A reconfiguration fenced behind the events queued before it was issued.
///
/// `after_events` is how many events the worker queue had accepted at that point; the
/// worker runs that many through the current pipeline before applying `registration`.
struct Reconfigure {
    after_events: u64,
    registration: Option<Registration>,
}

/// Handle the dispatch loop keeps for one running registration.
pub(crate) struct RegistrationWorker {
    name: String,
    worker_id: String,
    event_sender: Sender<Arc<Event>>,
    enqueued: AtomicU64,
    reconfigure_sender: UnboundedSender<Reconfigure>,
    stats: Arc<WorkerStats>,
    handle: JoinHandle<()>,
}

impl RegistrationWorker {
    /// Compiles the registration and starts its task. Nothing is spawned if the compile fails.
    pub(crate) fn spawn(
        registration: &Registration,
        event_queue_size: usize,
        sender_factory: Arc<dyn SenderFactory>,
    ) -> Result<Self, CompileError> {
        let pipeline = Pipeline::compile(registration, sender_factory.as_ref())?;

        let (event_sender, event_receiver) = mpsc::channel(event_queue_size.max(1));
        let (reconfigure_sender, reconfigure_receiver) = mpsc::unbounded_channel();
        let worker_id = Uuid::new_v4().to_string();
        let stats = Arc::new(WorkerStats::default());

        let worker_context = WorkerContext::new(worker_id.clone(), registration.name.clone());
        let handle = spawn_registration_loop(Self::registration_loop(
            worker_context,
            pipeline,
            sender_factory,
            event_receiver,
            reconfigure_receiver,
            stats.clone(),
        ));

        info!(
            event = events::WORKER_CREATE,
            component = COMPONENT,
            worker_id = worker_id.as_str(),
            registration = registration.name.as_str(),
            format = registration.format.as_str(),
            destination = registration.destination.as_str(),
            queue_size = event_queue_size,
            "registration worker started"
        );

        Ok(Self {
            name: registration.name.clone(),
            worker_id,
            event_sender,
            enqueued: AtomicU64::new(0),
            reconfigure_sender,
            stats,
            handle,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Non-blocking enqueue. A full queue drops the newest event.
    pub(crate) fn dispatch(&self, event: Arc<Event>) -> DispatchOutcome {
        match self.event_sender.try_send(event) {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Queued
            }
            Err(TrySendError::Full(_)) => DispatchOutcome::QueueFull,
            Err(TrySendError::Closed(_)) => DispatchOutcome::Terminated,
        }
    }

    /// Queues a new descriptor, or `None` to stop the worker. Events already queued are
    /// still processed under the current pipeline first. Returns `false` when the worker
    /// is already gone.
    pub(crate) fn reconfigure(&self, registration: Option<Registration>) -> bool {
        let update = Reconfigure {
            after_events: self.enqueued.load(Ordering::Relaxed),
            registration,
        };
        self.reconfigure_sender.send(update).is_ok()
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.reconfigure_sender.is_closed() || self.handle.is_finished()
    }

    pub(crate) fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn event_sender(&self) -> Sender<Arc<Event>> {
        self.event_sender.clone()
    }

    pub(crate) fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }

    async fn registration_loop(
        worker_context: WorkerContext,
        pipeline: Pipeline,
        sender_factory: Arc<dyn SenderFactory>,
        event_receiver: Receiver<Arc<Event>>,
        mut reconfigure_receiver: UnboundedReceiver<Reconfigure>,
        stats: Arc<WorkerStats>,
    ) {
        let mut state = LoopState {
            worker_context,
            pipeline,
            sender_factory,
            event_receiver,
            stats,
            taken: 0,
        };

        let reason = loop {
            tokio::select! {
                biased;
                update = reconfigure_receiver.recv() => {
                    let Some(update) = update else {
                        break fields::REASON_CHANNEL_CLOSED;
                    };
                    if let Err(reason) = state.apply(update).await {
                        break reason;
                    }
                }
                event = state.event_receiver.recv() => {
                    let Some(event) = event else {
                        break fields::REASON_CHANNEL_CLOSED;
                    };
                    if let Err(reason) = state.take(event, &mut reconfigure_receiver).await {
                        break reason;
                    }
                }
            }
        };

        let totals = state.stats.snapshot();
        info!(
            event = events::WORKER_TERMINATE,
            component = COMPONENT,
            worker_id = state.worker_context.worker_id.as_str(),
            registration = state.worker_context.registration.as_str(),
            reason,
            received = totals.received,
            filtered = totals.filtered,
            sent = totals.sent,
            failed = totals.failed,
            "registration worker stopped"
        );
    }
}

/// What the worker task owns while running. A swap lands between two events, never
/// inside one, and only after every event queued before the reconfiguration was issued.
struct LoopState {
    worker_context: WorkerContext,
    pipeline: Pipeline,
    sender_factory: Arc<dyn SenderFactory>,
    event_receiver: Receiver<Arc<Event>>,
    stats: Arc<WorkerStats>,
    // events dequeued so far
    taken: u64,
}

impl LoopState {
    /// Runs the events queued ahead of `update` under the current pipeline, then applies
    /// it. `Err` carries the reason the worker stops.
    async fn apply(&mut self, update: Reconfigure) -> Result<(), &'static str> {
        while self.taken < update.after_events {
            let Some(event) = self.event_receiver.recv().await else {
                break;
            };
            self.taken += 1;
            self.handle_event(&event).await;
        }

        let Some(registration) = update.registration else {
            return Err(fields::REASON_DELETED);
        };
        match Pipeline::compile(&registration, self.sender_factory.as_ref()) {
            Ok(next) => {
                self.pipeline = next;
                info!(
                    event = events::WORKER_RECONFIGURE_OK,
                    component = COMPONENT,
                    worker_id = self.worker_context.worker_id.as_str(),
                    registration = self.worker_context.registration.as_str(),
                    format = ?self.pipeline.format(),
                    "pipeline swapped"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::WORKER_RECONFIGURE_FAILED,
                    component = COMPONENT,
                    worker_id = self.worker_context.worker_id.as_str(),
                    registration = self.worker_context.registration.as_str(),
                    field = fields::format_field(err.field()),
                    err = %err,
                    "reconfiguration failed to compile; removing registration"
                );
                Err(fields::REASON_COMPILE_FAILED)
            }
        }
    }

    /// Handles one dequeued event. A reconfiguration issued before this event can still
    /// be sitting unread after the biased poll; it is applied first. One issued after it
    /// is applied once the event is done.
    async fn take(
        &mut self,
        event: Arc<Event>,
        reconfigure_receiver: &mut UnboundedReceiver<Reconfigure>,
    ) -> Result<(), &'static str> {
        self.taken += 1;
        let mut deferred = None;
        while let Ok(update) = reconfigure_receiver.try_recv() {
            if update.after_events < self.taken {
                self.apply(update).await?;
            } else {
                deferred = Some(update);
                break;
            }
        }

        self.handle_event(&event).await;
        match deferred {
            Some(update) => self.apply(update).await,
            None => Ok(()),
        }
    }

    async fn handle_event(&self, event: &Event) {
        let worker_context = &self.worker_context;
        let event_id = tracing::enabled!(Level::DEBUG).then(|| fields::format_event_id(event));

        if let Some(event_id) = event_id.as_deref() {
            debug!(
                event = events::SEND_ATTEMPT,
                component = COMPONENT,
                worker_id = worker_context.worker_id.as_str(),
                registration = worker_context.registration.as_str(),
                event_id,
                device = event.device.as_str(),
                "processing event"
            );
        }

        let outcome = self.pipeline.process(event).await;
        self.stats.record(&outcome);

        match &outcome {
            PipelineOutcome::Filtered => {
                if let Some(event_id) = event_id.as_deref() {
                    debug!(
                        event = events::EVENT_FILTERED,
                        component = COMPONENT,
                        worker_id = worker_context.worker_id.as_str(),
                        registration = worker_context.registration.as_str(),
                        event_id,
                        device = event.device.as_str(),
                        "event rejected by filter"
                    );
                }
            }
            PipelineOutcome::Sent => {
                if let Some(event_id) = event_id.as_deref() {
                    debug!(
                        event = events::SEND_OK,
                        component = COMPONENT,
                        worker_id = worker_context.worker_id.as_str(),
                        registration = worker_context.registration.as_str(),
                        event_id,
                        "event delivered"
                    );
                }
            }
            PipelineOutcome::TransformFailed(err) => {
                warn!(
                    event = events::TRANSFORM_FAILED,
                    component = COMPONENT,
                    worker_id = worker_context.worker_id.as_str(),
                    registration = worker_context.registration.as_str(),
                    device = event.device.as_str(),
                    err = %err,
                    "transform failed; event dropped"
                );
            }
            PipelineOutcome::SendFailed(err) => {
                warn!(
                    event = events::SEND_FAILED,
                    component = COMPONENT,
                    worker_id = worker_context.worker_id.as_str(),
                    registration = worker_context.registration.as_str(),
                    device = event.device.as_str(),
                    err = %err,
                    "send failed; event dropped"
                );
            }
        }
    }
}
