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

//! # export-distro
//!
//! `export-distro` forwards device events to an open set of registered destinations.
//! Each [`Registration`] names one destination (HTTP endpoint or MQTT topic) and the
//! chain applied before delivery: filters, a formatter, optional compression and optional
//! encryption.
//!
//! Usage centers on [`ExportDistro`]: give it a [`RegistrationRegistry`], an upstream
//! event channel, a change-notification channel and a shutdown token.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use export_distro::{
//!     CompileError, DistroConfig, Event, ExportDistro, Reading, Registration,
//!     RegistrationRegistry, RegistryError, SendError, Sender, SenderFactory, SenderTarget,
//! };
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # struct OneRegistration(Registration);
//! #
//! # #[async_trait]
//! # impl RegistrationRegistry for OneRegistration {
//! #     async fn fetch_registrations(&self) -> Result<Vec<Registration>, RegistryError> {
//! #         Ok(vec![self.0.clone()])
//! #     }
//! #     async fn fetch_registration(
//! #         &self,
//! #         name: &str,
//! #     ) -> Result<Option<Registration>, RegistryError> {
//! #         Ok((self.0.name == name).then(|| self.0.clone()))
//! #     }
//! # }
//! #
//! # struct Discard;
//! #
//! # #[async_trait]
//! # impl Sender for Discard {
//! #     async fn send(&self, _payload: Vec<u8>) -> Result<(), SendError> { Ok(()) }
//! # }
//! #
//! # impl SenderFactory for Discard {
//! #     fn build_sender(
//! #         &self,
//! #         _registration: &Registration,
//! #         _target: SenderTarget,
//! #     ) -> Result<Arc<dyn Sender>, CompileError> {
//! #         Ok(Arc::new(Discard))
//! #     }
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registration: Registration = serde_json::from_str(
//!     r#"{"name": "r1", "format": "JSON", "compression": "GZIP",
//!         "destination": "REST_ENDPOINT",
//!         "addressable": {"protocol": "HTTP", "address": "x", "path": "/y", "method": "POST"},
//!         "filter": {"deviceIdentifiers": ["devA"]}}"#,
//! )
//! .unwrap();
//!
//! let distro = ExportDistro::new(
//!     "quick-start",
//!     DistroConfig::default(),
//!     Arc::new(OneRegistration(registration)),
//! )
//! .with_sender_factory(Arc::new(Discard));
//!
//! let (events_tx, events) = mpsc::channel(16);
//! let (_notify_tx, notifications) = mpsc::channel(16);
//! let shutdown = CancellationToken::new();
//! let running = tokio::spawn(distro.run(events, notifications, shutdown.clone()));
//!
//! let event = Event::new("devA", 1).with_reading(Reading::new("temperature", "21"));
//! events_tx.send(Arc::new(event)).await.unwrap();
//!
//! tokio::time::sleep(Duration::from_millis(10)).await;
//! shutdown.cancel();
//! running.await.unwrap().unwrap();
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Dispatch loop: [`ExportDistro`], startup snapshot, event fan-out, shutdown
//! - Control plane: active registration set and add/update/delete lifecycle
//! - Data plane: one registration worker task per registration
//! - Pipeline: filters, formatters, transforms and senders compiled from a registration
//! - Runtime: task spawning/joining and the startup registry retry
//! - Ingress: newline-delimited JSON decoding for upstream streams
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events with stable `event`/`component` fields and does not
//! initialize a global subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod control_plane;
mod data_plane;
mod dispatch;
mod error;
mod event;
pub mod ingress;
#[doc(hidden)]
pub mod observability;
pub mod pipeline;
mod registration;
mod registry;
mod runtime;

#[cfg(test)]
mod test_support;

pub use dispatch::{DistroConfig, ExportDistro};
pub use error::{
    CompileError, DistroError, IngressError, LifecycleError, RegistryError, SendError,
    TransformError,
};
pub use event::{Event, Reading};
pub use pipeline::format::Format;
pub use pipeline::sender::{
    Destination, HttpMethod, HttpTarget, MqttTarget, Sender, SenderFactory, SenderTarget,
    TransportSenderFactory,
};
pub use pipeline::transform::{Compression, Encryption};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use registration::{
    Addressable, EncryptionDetails, FilterCriteria, NotifyOperation, NotifyUpdate, Registration,
};
pub use registry::RegistrationRegistry;
