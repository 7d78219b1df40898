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

//! Shared stubs for in-crate unit tests.

use crate::error::{CompileError, RegistryError, SendError};
use crate::event::{Event, Reading};
use crate::pipeline::sender::{Sender, SenderFactory, SenderTarget};
use crate::registration::Registration;
use crate::registry::RegistrationRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct RecordingSender {
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSender {
    pub(crate) fn count(&self) -> usize {
        self.payloads.lock().expect("payload lock").len()
    }

    pub(crate) async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.count() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("sender should receive the expected payloads");
    }
}

#[async_trait]
impl Sender for RecordingSender {
    async fn send(&self, payload: Vec<u8>) -> Result<(), SendError> {
        self.payloads.lock().expect("payload lock").push(payload);
        Ok(())
    }
}

/// Hands out one [`RecordingSender`] per registration name.
#[derive(Default)]
pub(crate) struct StubSenderFactory {
    senders: Mutex<HashMap<String, Arc<RecordingSender>>>,
}

impl StubSenderFactory {
    pub(crate) fn sender(&self, name: &str) -> Arc<RecordingSender> {
        self.senders
            .lock()
            .expect("sender lock")
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

impl SenderFactory for StubSenderFactory {
    fn build_sender(
        &self,
        registration: &Registration,
        _target: SenderTarget,
    ) -> Result<Arc<dyn Sender>, CompileError> {
        Ok(self.sender(&registration.name))
    }
}

#[derive(Default)]
pub(crate) struct StaticRegistry {
    registrations: Mutex<HashMap<String, Registration>>,
}

impl StaticRegistry {
    pub(crate) fn upsert(&self, registration: Registration) {
        self.registrations
            .lock()
            .expect("registry lock")
            .insert(registration.name.clone(), registration);
    }
}

#[async_trait]
impl RegistrationRegistry for StaticRegistry {
    async fn fetch_registrations(&self) -> Result<Vec<Registration>, RegistryError> {
        Ok(self
            .registrations
            .lock()
            .expect("registry lock")
            .values()
            .cloned()
            .collect())
    }

    async fn fetch_registration(&self, name: &str) -> Result<Option<Registration>, RegistryError> {
        Ok(self.registrations.lock().expect("registry lock").get(name).cloned())
    }
}

pub(crate) fn rest_registration(name: &str) -> Registration {
    let mut registration = Registration::new(name);
    registration.format = "JSON".to_string();
    registration.destination = "REST_ENDPOINT".to_string();
    registration.addressable.protocol = "HTTP".to_string();
    registration.addressable.address = "x".to_string();
    registration.addressable.method = "POST".to_string();
    registration
}

pub(crate) fn sample_event(device: &str) -> Arc<Event> {
    Arc::new(Event::new(device, 1).with_reading(Reading::new("temperature", "20")))
}
