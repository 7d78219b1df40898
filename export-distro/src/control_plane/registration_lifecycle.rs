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

//! Applies registry change notifications to the active registration set.

use crate::control_plane::active_set::ActiveRegistrations;
use crate::data_plane::registration_worker::RegistrationWorker;
use crate::error::LifecycleError;
use crate::pipeline::sender::SenderFactory;
use crate::registration::{NotifyOperation, NotifyUpdate, Registration};
use crate::registry::RegistrationRegistry;
use std::sync::Arc;

/// Orchestrates one notification across the registry, the active set and the workers.
pub(crate) struct RegistrationLifecycle<'a> {
    active: &'a mut ActiveRegistrations,
    registry: &'a dyn RegistrationRegistry,
    sender_factory: &'a Arc<dyn SenderFactory>,
    event_queue_size: usize,
}

impl<'a> RegistrationLifecycle<'a> {
    pub(crate) fn new(
        active: &'a mut ActiveRegistrations,
        registry: &'a dyn RegistrationRegistry,
        sender_factory: &'a Arc<dyn SenderFactory>,
        event_queue_size: usize,
    ) -> Self {
        Self {
            active,
            registry,
            sender_factory,
            event_queue_size,
        }
    }

    pub(crate) async fn apply(&mut self, update: &NotifyUpdate) -> Result<(), LifecycleError> {
        match update.operation {
            NotifyOperation::Add => self.add(&update.name).await,
            NotifyOperation::Update => self.update(&update.name).await,
            NotifyOperation::Delete => self.delete(&update.name),
        }
    }

    /// Re-fetches the descriptor and starts a worker. A terminated entry under the same
    /// name is replaced.
    async fn add(&mut self, name: &str) -> Result<(), LifecycleError> {
        if self.active.contains_live(name) {
            return Err(LifecycleError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let registration = self.fetch(name).await?;
        let worker = RegistrationWorker::spawn(
            &registration,
            self.event_queue_size,
            self.sender_factory.clone(),
        )
        .map_err(|source| LifecycleError::Compile {
            name: name.to_string(),
            source,
        })?;

        self.active.insert(worker);
        Ok(())
    }

    /// Re-fetches the descriptor and forwards it to the running worker. The worker
    /// compiles it and either swaps pipelines or stops.
    async fn update(&mut self, name: &str) -> Result<(), LifecycleError> {
        let Some(worker) = self.active.get(name) else {
            return Err(LifecycleError::NotFound {
                name: name.to_string(),
            });
        };

        if worker.is_terminated() {
            self.active.remove(name);
            return Err(LifecycleError::WorkerTerminated {
                name: name.to_string(),
            });
        }

        let registration = self.fetch(name).await?;
        let forwarded = self
            .active
            .get(name)
            .is_some_and(|worker| worker.reconfigure(Some(registration)));

        if !forwarded {
            self.active.remove(name);
            return Err(LifecycleError::WorkerTerminated {
                name: name.to_string(),
            });
        }

        Ok(())
    }

    /// Stops the worker and drops the entry right away.
    fn delete(&mut self, name: &str) -> Result<(), LifecycleError> {
        let worker = self
            .active
            .remove(name)
            .ok_or_else(|| LifecycleError::NotFound {
                name: name.to_string(),
            })?;

        worker.reconfigure(None);
        Ok(())
    }

    async fn fetch(&self, name: &str) -> Result<Registration, LifecycleError> {
        self.registry
            .fetch_registration(name)
            .await
            .map_err(|source| LifecycleError::Registry {
                name: name.to_string(),
                source,
            })?
            .ok_or_else(|| LifecycleError::RegistrationMissing {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::RegistrationLifecycle;
    use crate::control_plane::active_set::ActiveRegistrations;
    use crate::error::LifecycleError;
    use crate::pipeline::sender::SenderFactory;
    use crate::registration::NotifyUpdate;
    use crate::test_support::{rest_registration, sample_event, StaticRegistry, StubSenderFactory};
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        active: ActiveRegistrations,
        registry: StaticRegistry,
        stubs: Arc<StubSenderFactory>,
        factory: Arc<dyn SenderFactory>,
    }

    impl Fixture {
        fn new() -> Self {
            let stubs = Arc::new(StubSenderFactory::default());
            Self {
                active: ActiveRegistrations::new(),
                registry: StaticRegistry::default(),
                factory: stubs.clone(),
                stubs,
            }
        }

        async fn apply(&mut self, update: NotifyUpdate) -> Result<(), LifecycleError> {
            RegistrationLifecycle::new(&mut self.active, &self.registry, &self.factory, 8)
                .apply(&update)
                .await
        }
    }

    #[tokio::test]
    async fn add_fetches_and_starts_worker() {
        let mut fixture = Fixture::new();
        fixture.registry.upsert(rest_registration("r1"));

        fixture.apply(NotifyUpdate::add("r1")).await.expect("add");
        assert!(fixture.active.contains_live("r1"));

        let duplicate = fixture.apply(NotifyUpdate::add("r1")).await;
        assert!(matches!(duplicate, Err(LifecycleError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn add_of_unknown_or_broken_registration_creates_nothing() {
        let mut fixture = Fixture::new();

        let missing = fixture.apply(NotifyUpdate::add("ghost")).await;
        assert!(matches!(
            missing,
            Err(LifecycleError::RegistrationMissing { .. })
        ));

        let mut broken = rest_registration("r1");
        broken.format = "SERIALIZED".to_string();
        fixture.registry.upsert(broken);

        let error = fixture
            .apply(NotifyUpdate::add("r1"))
            .await
            .expect_err("compile failure should surface");
        match error {
            LifecycleError::Compile { source, .. } => assert_eq!(source.field(), Some("format")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fixture.active.len(), 0);
    }

    #[tokio::test]
    async fn update_requires_running_worker() {
        let mut fixture = Fixture::new();
        fixture.registry.upsert(rest_registration("r1"));

        let error = fixture.apply(NotifyUpdate::update("r1")).await;

        assert!(matches!(error, Err(LifecycleError::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_that_fails_to_compile_removes_registration() {
        let mut fixture = Fixture::new();
        fixture.registry.upsert(rest_registration("r1"));
        fixture.apply(NotifyUpdate::add("r1")).await.expect("add");
        let queue = fixture
            .active
            .get("r1")
            .expect("worker should be active")
            .event_sender();

        let mut broken = rest_registration("r1");
        broken.compression = "LZ4".to_string();
        fixture.registry.upsert(broken);
        fixture
            .apply(NotifyUpdate::update("r1"))
            .await
            .expect("update is forwarded to the worker");

        tokio::time::timeout(Duration::from_secs(5), queue.closed())
            .await
            .expect("worker should stop on a broken update");

        let error = fixture.apply(NotifyUpdate::update("r1")).await;
        assert!(matches!(
            error,
            Err(LifecycleError::WorkerTerminated { .. })
        ));
        assert!(fixture.active.get("r1").is_none());

        // the terminated entry is gone, so a fixed registration can be added again
        fixture.registry.upsert(rest_registration("r1"));
        fixture.apply(NotifyUpdate::add("r1")).await.expect("re-add");
    }

    #[tokio::test]
    async fn delete_removes_entry_and_stops_delivery() {
        let mut fixture = Fixture::new();
        fixture.registry.upsert(rest_registration("r1"));
        fixture.apply(NotifyUpdate::add("r1")).await.expect("add");

        fixture.active.broadcast(sample_event("devA"));
        fixture.stubs.sender("r1").wait_for(1).await;
        let queue = fixture
            .active
            .get("r1")
            .expect("worker should be active")
            .event_sender();

        fixture.apply(NotifyUpdate::delete("r1")).await.expect("delete");

        assert!(fixture.active.get("r1").is_none());
        tokio::time::timeout(Duration::from_secs(1), queue.closed())
            .await
            .expect("deleted worker should exit within a bounded time");

        fixture.active.broadcast(sample_event("devA"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fixture.stubs.sender("r1").count(), 1);

        let again = fixture.apply(NotifyUpdate::delete("r1")).await;
        assert!(matches!(again, Err(LifecycleError::NotFound { .. })));
    }
}
