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

use crate::control_plane::active_set::ActiveRegistrations;
use crate::control_plane::registration_lifecycle::RegistrationLifecycle;
use crate::data_plane::registration_worker::RegistrationWorker;
use crate::error::DistroError;
use crate::event::Event;
use crate::observability::{events, fields};
use crate::pipeline::sender::{SenderFactory, TransportSenderFactory};
use crate::registration::{NotifyUpdate, Registration};
use crate::registry::RegistrationRegistry;
use crate::runtime::registry_bootstrap::fetch_initial_registrations;
use crate::runtime::worker_runtime::{join_with_timeout, JoinOutcome};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "dispatch_loop";

/// Tunables for one [`ExportDistro`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistroConfig {
    /// Capacity of each worker's event queue.
    pub event_queue_size: usize,
    /// Delay between startup attempts to read the registry.
    pub registry_retry_interval: Duration,
    /// How long shutdown waits for workers to finish.
    pub shutdown_grace: Duration,
    /// Request timeout for HTTP destinations.
    pub http_timeout: Duration,
}

impl Default for DistroConfig {
    fn default() -> Self {
        Self {
            event_queue_size: 64,
            registry_retry_interval: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(5),
            http_timeout: Duration::from_secs(30),
        }
    }
}

///
/// [`ExportDistro`] is the dispatch loop: it owns the active registration set, fans
/// inbound events out to every registration worker and applies registry change
/// notifications.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use export_distro::{
///     DistroConfig, DistroError, ExportDistro, Registration, RegistrationRegistry,
///     RegistryError,
/// };
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
///
/// struct Unreachable;
///
/// #[async_trait]
/// impl RegistrationRegistry for Unreachable {
///     async fn fetch_registrations(&self) -> Result<Vec<Registration>, RegistryError> {
///         Err(RegistryError::Unavailable("offline".to_string()))
///     }
///
///     async fn fetch_registration(
///         &self,
///         _name: &str,
///     ) -> Result<Option<Registration>, RegistryError> {
///         Ok(None)
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let distro = ExportDistro::new("doc", DistroConfig::default(), Arc::new(Unreachable));
/// let (_events_tx, events) = mpsc::channel(16);
/// let (_notify_tx, notifications) = mpsc::channel(16);
/// let shutdown = CancellationToken::new();
///
/// // The registry never answers, so shutdown lands during startup.
/// shutdown.cancel();
/// let result = distro.run(events, notifications, shutdown).await;
/// assert!(matches!(result, Err(DistroError::ShutdownDuringStartup)));
/// # });
/// ```
pub struct ExportDistro {
    name: String,
    config: DistroConfig,
    registry: Arc<dyn RegistrationRegistry>,
    sender_factory: Arc<dyn SenderFactory>,
}

impl ExportDistro {
    /// Creates a dispatch loop that delivers through real HTTP and MQTT clients.
    pub fn new(name: &str, config: DistroConfig, registry: Arc<dyn RegistrationRegistry>) -> Self {
        let sender_factory: Arc<dyn SenderFactory> =
            Arc::new(TransportSenderFactory::new(config.http_timeout));

        Self {
            name: name.to_string(),
            config,
            registry,
            sender_factory,
        }
    }

    /// Replaces the factory that turns compiled destinations into senders.
    pub fn with_sender_factory(mut self, sender_factory: Arc<dyn SenderFactory>) -> Self {
        self.sender_factory = sender_factory;
        self
    }

    /// Runs until `shutdown` fires or the upstream event channel closes.
    ///
    /// Returns [`DistroError::ShutdownDuringStartup`] when shutdown arrives before the
    /// registry produced its first snapshot.
    pub async fn run(
        self,
        mut upstream: Receiver<Arc<Event>>,
        mut notifications: Receiver<NotifyUpdate>,
        shutdown: CancellationToken,
    ) -> Result<(), DistroError> {
        info!(
            event = events::DISTRO_START,
            component = COMPONENT,
            distro = self.name.as_str(),
            queue_size = self.config.event_queue_size,
            "export distro starting"
        );

        let Some(registrations) = fetch_initial_registrations(
            &self.name,
            self.registry.as_ref(),
            self.config.registry_retry_interval,
            &shutdown,
        )
        .await
        else {
            info!(
                event = events::STARTUP_ABORTED,
                component = COMPONENT,
                distro = self.name.as_str(),
                "shutdown before registry snapshot; aborting startup"
            );
            return Err(DistroError::ShutdownDuringStartup);
        };

        let mut active = ActiveRegistrations::new();
        self.start_workers(&mut active, registrations);

        let mut notifications_open = true;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                update = notifications.recv(), if notifications_open => match update {
                    Some(update) => self.apply_notification(&mut active, &update).await,
                    None => {
                        notifications_open = false;
                        info!(
                            event = events::NOTIFY_CHANNEL_CLOSED,
                            component = COMPONENT,
                            distro = self.name.as_str(),
                            "notification channel closed; registration set is now fixed"
                        );
                    }
                },
                event = upstream.recv() => match event {
                    Some(event) => {
                        let summary = active.broadcast(event);
                        if summary.dropped > 0 || summary.purged > 0 {
                            debug!(
                                event = events::FANOUT_PARTIAL,
                                component = COMPONENT,
                                distro = self.name.as_str(),
                                queued = summary.queued,
                                dropped = summary.dropped,
                                purged = summary.purged,
                                "event not delivered to every registration"
                            );
                        }
                    }
                    None => {
                        info!(
                            event = events::UPSTREAM_CLOSED,
                            component = COMPONENT,
                            distro = self.name.as_str(),
                            reason = fields::REASON_CHANNEL_CLOSED,
                            "upstream event channel closed; shutting down"
                        );
                        break;
                    }
                },
            }
        }

        self.shutdown_workers(active).await;

        info!(
            event = events::DISTRO_STOP,
            component = COMPONENT,
            distro = self.name.as_str(),
            "export distro stopped"
        );
        Ok(())
    }

    fn start_workers(&self, active: &mut ActiveRegistrations, registrations: Vec<Registration>) {
        for registration in registrations {
            if active.contains_live(&registration.name) {
                warn!(
                    event = events::WORKER_CREATE_FAILED,
                    component = COMPONENT,
                    distro = self.name.as_str(),
                    registration = registration.name.as_str(),
                    reason = "duplicate_name",
                    "registry returned a duplicate registration; keeping the first"
                );
                continue;
            }

            match RegistrationWorker::spawn(
                &registration,
                self.config.event_queue_size,
                self.sender_factory.clone(),
            ) {
                Ok(worker) => {
                    active.insert(worker);
                }
                Err(err) => {
                    warn!(
                        event = events::WORKER_CREATE_FAILED,
                        component = COMPONENT,
                        distro = self.name.as_str(),
                        registration = registration.name.as_str(),
                        field = fields::format_field(err.field()),
                        err = %err,
                        "registration failed to compile; not started"
                    );
                }
            }
        }

        info!(
            event = events::WORKERS_STARTED,
            component = COMPONENT,
            distro = self.name.as_str(),
            active = active.len(),
            "initial registration workers started"
        );
    }

    async fn apply_notification(&self, active: &mut ActiveRegistrations, update: &NotifyUpdate) {
        info!(
            event = events::NOTIFY_APPLY_START,
            component = COMPONENT,
            distro = self.name.as_str(),
            registration = update.name.as_str(),
            operation = %update.operation,
            "applying registration change"
        );

        let result = RegistrationLifecycle::new(
            active,
            self.registry.as_ref(),
            &self.sender_factory,
            self.config.event_queue_size,
        )
        .apply(update)
        .await;

        match result {
            Ok(()) => info!(
                event = events::NOTIFY_APPLY_OK,
                component = COMPONENT,
                distro = self.name.as_str(),
                registration = update.name.as_str(),
                operation = %update.operation,
                active = active.len(),
                "registration change applied"
            ),
            Err(err) => warn!(
                event = events::NOTIFY_APPLY_FAILED,
                component = COMPONENT,
                distro = self.name.as_str(),
                registration = update.name.as_str(),
                operation = %update.operation,
                err = %err,
                "registration change rejected"
            ),
        }
    }

    /// Sends the stop signal to every worker still running, then joins all of them
    /// concurrently under one grace period.
    async fn shutdown_workers(&self, mut active: ActiveRegistrations) {
        let workers = active.drain();
        info!(
            event = events::SHUTDOWN_START,
            component = COMPONENT,
            distro = self.name.as_str(),
            workers = workers.len(),
            "stopping registration workers"
        );

        let grace = self.config.shutdown_grace;
        let joins = workers.into_iter().map(|worker| {
            if !worker.is_terminated() {
                worker.reconfigure(None);
            }
            let name = worker.name().to_string();
            let stats = worker.stats();
            async move { (name, stats, join_with_timeout(worker.into_handle(), grace).await) }
        });

        for (name, stats, outcome) in join_all(joins).await {
            if outcome != JoinOutcome::Finished {
                warn!(
                    event = events::SHUTDOWN_WORKER_TIMEOUT,
                    component = COMPONENT,
                    distro = self.name.as_str(),
                    registration = name.as_str(),
                    outcome = ?outcome,
                    received = stats.received,
                    grace_ms = grace.as_millis() as u64,
                    reason = fields::REASON_SHUTDOWN,
                    "registration worker did not stop cleanly"
                );
            }
        }
    }
}
