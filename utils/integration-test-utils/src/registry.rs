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

use async_trait::async_trait;
use export_distro::{Registration, RegistrationRegistry, RegistryError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Registry backed by a map, with injectable outages for the startup snapshot.
#[derive(Default)]
pub struct InMemoryRegistry {
    registrations: Mutex<BTreeMap<String, Registration>>,
    failing_fetches: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl InMemoryRegistry {
    pub fn with(registrations: impl IntoIterator<Item = Registration>) -> Self {
        let registry = Self::default();
        for registration in registrations {
            registry.upsert(registration);
        }
        registry
    }

    pub fn upsert(&self, registration: Registration) {
        self.registrations
            .lock()
            .expect("registry lock should not be poisoned")
            .insert(registration.name.clone(), registration);
    }

    pub fn remove(&self, name: &str) {
        self.registrations
            .lock()
            .expect("registry lock should not be poisoned")
            .remove(name);
    }

    /// The next `count` calls to `fetch_registrations` report the registry unavailable.
    pub fn fail_next_fetches(&self, count: usize) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrationRegistry for InMemoryRegistry {
    async fn fetch_registrations(&self) -> Result<Vec<Registration>, RegistryError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if failing.is_ok() {
            return Err(RegistryError::Unavailable("registry offline".to_string()));
        }

        Ok(self
            .registrations
            .lock()
            .expect("registry lock should not be poisoned")
            .values()
            .cloned()
            .collect())
    }

    async fn fetch_registration(&self, name: &str) -> Result<Option<Registration>, RegistryError> {
        Ok(self
            .registrations
            .lock()
            .expect("registry lock should not be poisoned")
            .get(name)
            .cloned())
    }
}
