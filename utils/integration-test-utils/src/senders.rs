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
use export_distro::{CompileError, Registration, SendError, Sender, SenderFactory, SenderTarget};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

const WAIT_POLL: Duration = Duration::from_millis(5);

async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    tokio::time::timeout(timeout, async {
        while !condition() {
            tokio::time::sleep(WAIT_POLL).await;
        }
    })
    .await
    .is_ok()
}

/// Keeps every payload it is handed.
#[derive(Default)]
pub struct RecordingSender {
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSender {
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads
            .lock()
            .expect("payload lock should not be poisoned")
            .clone()
    }

    pub fn count(&self) -> usize {
        self.payloads
            .lock()
            .expect("payload lock should not be poisoned")
            .len()
    }

    /// Waits until at least `count` payloads arrived. Returns `false` on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.count() >= count).await
    }
}

#[async_trait]
impl Sender for RecordingSender {
    async fn send(&self, payload: Vec<u8>) -> Result<(), SendError> {
        self.payloads
            .lock()
            .expect("payload lock should not be poisoned")
            .push(payload);
        Ok(())
    }
}

/// Rejects every payload, counting the attempts.
#[derive(Default)]
pub struct FailingSender {
    attempts: AtomicUsize,
}

impl FailingSender {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sender for FailingSender {
    async fn send(&self, _payload: Vec<u8>) -> Result<(), SendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SendError::Transport("connection refused".to_string()))
    }
}

/// Records payloads but holds every send until a permit is released.
pub struct GatedSender {
    gate: Semaphore,
    entered: AtomicUsize,
    recorder: RecordingSender,
}

impl Default for GatedSender {
    fn default() -> Self {
        Self {
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
            recorder: RecordingSender::default(),
        }
    }
}

impl GatedSender {
    pub fn release(&self, sends: usize) {
        self.gate.add_permits(sends);
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub async fn wait_entered(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.entered() >= count).await
    }

    pub fn recorder(&self) -> &RecordingSender {
        &self.recorder
    }
}

#[async_trait]
impl Sender for GatedSender {
    async fn send(&self, payload: Vec<u8>) -> Result<(), SendError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| SendError::Transport(err.to_string()))?;
        permit.forget();
        self.recorder.send(payload).await
    }
}

/// Sender factory keyed by registration name.
///
/// Names without an installed sender get a fresh [`RecordingSender`]. Every resolved
/// target is kept for inspection.
#[derive(Default)]
pub struct StubSenderFactory {
    senders: Mutex<HashMap<String, Arc<dyn Sender>>>,
    recorders: Mutex<HashMap<String, Arc<RecordingSender>>>,
    targets: Mutex<Vec<(String, SenderTarget)>>,
}

impl StubSenderFactory {
    pub fn install(&self, name: &str, sender: Arc<dyn Sender>) {
        self.senders
            .lock()
            .expect("sender lock should not be poisoned")
            .insert(name.to_string(), sender);
    }

    /// The recording sender used for `name`, created on first use.
    pub fn recorder(&self, name: &str) -> Arc<RecordingSender> {
        self.recorders
            .lock()
            .expect("recorder lock should not be poisoned")
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    pub fn targets(&self, name: &str) -> Vec<SenderTarget> {
        self.targets
            .lock()
            .expect("target lock should not be poisoned")
            .iter()
            .filter(|(registration, _)| registration == name)
            .map(|(_, target)| target.clone())
            .collect()
    }
}

impl SenderFactory for StubSenderFactory {
    fn build_sender(
        &self,
        registration: &Registration,
        target: SenderTarget,
    ) -> Result<Arc<dyn Sender>, CompileError> {
        self.targets
            .lock()
            .expect("target lock should not be poisoned")
            .push((registration.name.clone(), target));

        let installed = self
            .senders
            .lock()
            .expect("sender lock should not be poisoned")
            .get(&registration.name)
            .cloned();

        match installed {
            Some(sender) => Ok(sender),
            None => Ok(self.recorder(&registration.name)),
        }
    }
}
