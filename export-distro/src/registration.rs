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

//! Registration descriptors and change notifications as supplied by the registry.
//!
//! Selector fields (`format`, `compression`, `destination`, `encryption.encryptionAlgorithm`,
//! `addressable.method`) stay as the registry's strings here and are only resolved into
//! closed enums when a pipeline is compiled.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const DEFAULT_MQTT_KEEP_ALIVE_SECS: u64 = 60;
const DEFAULT_MQTT_CONNECT_TIMEOUT_SECS: u64 = 30;

///
/// [`Registration`] describes one export destination and the processing applied before
/// events reach it. The `name` is the unique key across the active set.
///
/// # Examples
///
/// ```
/// use export_distro::Registration;
///
/// let registration: Registration = serde_json::from_str(
///     r#"{
///         "name": "r1",
///         "addressable": {"protocol": "HTTP", "address": "x", "path": "/y", "method": "POST"},
///         "format": "JSON",
///         "compression": "GZIP",
///         "destination": "REST_ENDPOINT",
///         "filter": {"deviceIdentifiers": ["devA"]}
///     }"#,
/// )
/// .unwrap();
///
/// assert!(registration.enable);
/// assert_eq!(registration.addressable.url(), "http://x/y");
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    #[serde(default)]
    pub addressable: Addressable,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub filter: FilterCriteria,
    #[serde(default)]
    pub encryption: EncryptionDetails,
    #[serde(default)]
    pub compression: String,
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default)]
    pub destination: String,
}

impl Default for Registration {
    fn default() -> Self {
        Self {
            name: String::new(),
            addressable: Addressable::default(),
            format: String::new(),
            filter: FilterCriteria::default(),
            encryption: EncryptionDetails::default(),
            compression: String::new(),
            enable: true,
            destination: String::new(),
        }
    }
}

impl Registration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

fn default_enable() -> bool {
    true
}

/// Wire address of a destination. HTTP uses protocol/address/port/path/method,
/// MQTT uses address/port/topic plus the session options.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Addressable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub qos: u8,
    #[serde(default)]
    pub retained: bool,
    #[serde(default = "default_keep_alive")]
    pub keep_alive: u64,
    #[serde(default = "default_enable")]
    pub auto_reconnect: bool,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for Addressable {
    fn default() -> Self {
        Self {
            name: String::new(),
            protocol: String::new(),
            address: String::new(),
            port: 0,
            path: String::new(),
            method: String::new(),
            publisher: String::new(),
            user: String::new(),
            password: String::new(),
            topic: String::new(),
            qos: 0,
            retained: false,
            keep_alive: DEFAULT_MQTT_KEEP_ALIVE_SECS,
            auto_reconnect: true,
            connect_timeout: DEFAULT_MQTT_CONNECT_TIMEOUT_SECS,
        }
    }
}

fn default_keep_alive() -> u64 {
    DEFAULT_MQTT_KEEP_ALIVE_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_MQTT_CONNECT_TIMEOUT_SECS
}

impl Addressable {
    /// Builds `protocol://address[:port]path`. A zero port leaves the scheme default.
    pub fn url(&self) -> String {
        let scheme = self.protocol.to_ascii_lowercase();
        if self.port == 0 {
            format!("{scheme}://{}{}", self.address, self.path)
        } else {
            format!("{scheme}://{}:{}{}", self.address, self.port, self.path)
        }
    }
}

/// Allow-lists applied before formatting. An empty list means no filtering on that axis.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FilterCriteria {
    #[serde(rename = "deviceIdentifiers", default)]
    pub device_ids: Vec<String>,
    #[serde(rename = "valueDescriptorIdentifiers", default)]
    pub value_descriptor_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EncryptionDetails {
    #[serde(rename = "encryptionAlgorithm", default)]
    pub algo: String,
    #[serde(rename = "encryptionKey", default)]
    pub key: String,
    #[serde(rename = "initializingVector", default)]
    pub init_vector: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOperation {
    Add,
    Update,
    Delete,
}

impl Display for NotifyOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyOperation::Add => write!(f, "add"),
            NotifyOperation::Update => write!(f, "update"),
            NotifyOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Change notification from the registry. Only the name travels; add and update
/// re-fetch the full descriptor before anything is reconfigured.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct NotifyUpdate {
    pub name: String,
    pub operation: NotifyOperation,
}

impl NotifyUpdate {
    pub fn add(name: &str) -> Self {
        Self {
            name: name.to_string(),
            operation: NotifyOperation::Add,
        }
    }

    pub fn update(name: &str) -> Self {
        Self {
            name: name.to_string(),
            operation: NotifyOperation::Update,
        }
    }

    pub fn delete(name: &str) -> Self {
        Self {
            name: name.to_string(),
            operation: NotifyOperation::Delete,
        }
    }
}
