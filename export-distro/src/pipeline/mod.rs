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

//! Per-registration processing pipeline.
//!
//! A [`Pipeline`] is the compiled form of one [`Registration`]. Every selector string is
//! resolved into a closed enum while compiling, so a running pipeline never meets an
//! unknown format or transport. The stage order is fixed:
//!
//! `filters → formatter → compression? → encryption? → sender`
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use export_distro::{
//!     CompileError, Event, Pipeline, Reading, Registration, SendError, Sender, SenderFactory,
//!     SenderTarget,
//! };
//!
//! struct DiscardSender;
//!
//! #[async_trait]
//! impl Sender for DiscardSender {
//!     async fn send(&self, _payload: Vec<u8>) -> Result<(), SendError> {
//!         Ok(())
//!     }
//! }
//!
//! struct DiscardFactory;
//!
//! impl SenderFactory for DiscardFactory {
//!     fn build_sender(
//!         &self,
//!         _registration: &Registration,
//!         _target: SenderTarget,
//!     ) -> Result<Arc<dyn Sender>, CompileError> {
//!         Ok(Arc::new(DiscardSender))
//!     }
//! }
//!
//! let mut registration = Registration::new("r1");
//! registration.format = "JSON".to_string();
//! registration.destination = "REST_ENDPOINT".to_string();
//! registration.addressable.protocol = "HTTP".to_string();
//! registration.addressable.address = "x".to_string();
//! registration.addressable.method = "POST".to_string();
//! registration.filter.device_ids = vec!["devA".to_string()];
//!
//! let pipeline = Pipeline::compile(&registration, &DiscardFactory).unwrap();
//!
//! let accepted = Event::new("devA", 1).with_reading(Reading::new("t", "1"));
//! let rejected = Event::new("devB", 1).with_reading(Reading::new("t", "1"));
//! assert!(pipeline.encode(&accepted).unwrap().is_some());
//! assert!(pipeline.encode(&rejected).unwrap().is_none());
//!
//! registration.format = "CSV".to_string();
//! let error = Pipeline::compile(&registration, &DiscardFactory).err().unwrap();
//! assert_eq!(error.field(), Some("format"));
//! ```

pub mod filter;
pub mod format;
pub mod sender;
pub mod transform;

use crate::error::{CompileError, SendError, TransformError};
use crate::event::Event;
use crate::registration::Registration;
use filter::{build_filters, EventFilter};
use format::{Format, Formatter};
use sender::{Destination, Sender, SenderFactory, SenderTarget};
use std::borrow::Cow;
use std::sync::Arc;
use transform::{Compression, Encryption, Transformer};

const TRANSFORMED_CONTENT_TYPE: &str = "application/octet-stream";

/// Result of running one event through a pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A filter rejected the event before formatting.
    Filtered,
    Sent,
    TransformFailed(TransformError),
    SendFailed(SendError),
}

pub struct Pipeline {
    filters: Vec<Box<dyn EventFilter>>,
    format: Format,
    formatter: Box<dyn Formatter>,
    compression: Option<Box<dyn Transformer>>,
    encryption: Option<Box<dyn Transformer>>,
    sender: Arc<dyn Sender>,
}

impl Pipeline {
    /// Compiles a registration as a whole. Any unsupported or invalid selector fails the
    /// compile and nothing is built.
    pub fn compile(
        registration: &Registration,
        sender_factory: &dyn SenderFactory,
    ) -> Result<Self, CompileError> {
        if !registration.enable {
            return Err(CompileError::Disabled);
        }

        let format: Format = registration.format.parse()?;
        let compression: Compression = registration.compression.parse()?;
        let encryption: Encryption = registration.encryption.algo.parse()?;
        let destination: Destination = registration.destination.parse()?;

        let content_type = if compression == Compression::None && encryption == Encryption::None
        {
            format.content_type()
        } else {
            TRANSFORMED_CONTENT_TYPE
        };

        let encryption = encryption.transformer(&registration.encryption)?;
        let target = SenderTarget::resolve(destination, &registration.addressable, content_type)?;
        let sender = sender_factory.build_sender(registration, target)?;

        Ok(Self {
            filters: build_filters(&registration.filter),
            format,
            formatter: format.formatter(),
            compression: compression.transformer(),
            encryption,
            sender,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Runs every stage up to, not including, the sender.
    ///
    /// Returns `Ok(None)` when a filter rejected the event.
    pub fn encode(&self, event: &Event) -> Result<Option<Vec<u8>>, TransformError> {
        let mut current = Cow::Borrowed(event);
        for filter in &self.filters {
            let (accepted, next) = filter.apply(current);
            if !accepted {
                return Ok(None);
            }
            current = next;
        }

        let mut payload = self.formatter.format(&current);
        if let Some(compression) = &self.compression {
            payload = compression.transform(&payload)?;
        }
        if let Some(encryption) = &self.encryption {
            payload = encryption.transform(&payload)?;
        }

        Ok(Some(payload))
    }

    pub async fn process(&self, event: &Event) -> PipelineOutcome {
        let payload = match self.encode(event) {
            Ok(Some(payload)) => payload,
            Ok(None) => return PipelineOutcome::Filtered,
            Err(err) => return PipelineOutcome::TransformFailed(err),
        };

        match self.sender.send(payload).await {
            Ok(()) => PipelineOutcome::Sent,
            Err(err) => PipelineOutcome::SendFailed(err),
        }
    }
}
