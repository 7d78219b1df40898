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

//! Error types, one enum per concern.

use thiserror::Error;

/// Registration-to-pipeline compilation failures. Fatal to one registration only.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CompileError {
    #[error("registration is disabled")]
    Disabled,

    #[error("{field} not supported: {value:?}")]
    Unsupported { field: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl CompileError {
    pub(crate) fn unsupported(field: &'static str, value: &str) -> Self {
        CompileError::Unsupported {
            field,
            value: value.to_string(),
        }
    }

    /// Registration field that caused the failure, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CompileError::Disabled => Some("enable"),
            CompileError::Unsupported { field, .. } | CompileError::Invalid { field, .. } => {
                Some(field)
            }
        }
    }
}

/// Delivery failures. Logged by the worker and dropped, never retried.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("destination answered HTTP {0}")]
    Status(u16),

    #[error("mqtt publish failed: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("stream codec failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cipher rejected payload: {0}")]
    Cipher(String),
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("registry returned malformed data: {0}")]
    Malformed(String),
}

/// Failures applying one change notification to the active set.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("registration {name} is not running")]
    NotFound { name: String },

    #[error("registration {name} is already running")]
    AlreadyExists { name: String },

    #[error("registration {name} is unknown to the registry")]
    RegistrationMissing { name: String },

    #[error("registration {name} worker already terminated")]
    WorkerTerminated { name: String },

    #[error("registry lookup for {name} failed: {source}")]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("registration {name} failed to compile: {source}")]
    Compile {
        name: String,
        #[source]
        source: CompileError,
    },
}

#[derive(Debug, Error)]
pub enum DistroError {
    #[error("shutdown requested before the registration snapshot was available")]
    ShutdownDuringStartup,
}

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("undecodable message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("ingress stream failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("rejected message: {0}")]
    Invalid(String),
}
