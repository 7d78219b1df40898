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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// [`Event`] is one device-generated sample set as delivered by the upstream transport.
///
/// Events are shared read-only between every registration worker (`Arc<Event>`). A filter
/// that needs to drop readings builds a new [`Event`] rather than touching the shared one.
///
/// # Examples
///
/// ```
/// use export_distro::{Event, Reading};
///
/// let event = Event::new("thermostat-1", 1_700_000_000_000)
///     .with_reading(Reading::new("temperature", "21.5"))
///     .with_tag("site", "hallway");
///
/// assert_eq!(event.readings.len(), 1);
/// assert!(event.has_reading("temperature"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub device: String,
    #[serde(default)]
    pub origin: i64,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// A single value reported under a value descriptor name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub origin: i64,
}

impl Event {
    pub fn new(device: &str, origin: i64) -> Self {
        Self {
            device: device.to_string(),
            origin,
            ..Default::default()
        }
    }

    pub fn with_reading(mut self, reading: Reading) -> Self {
        self.readings.push(reading);
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn has_reading(&self, name: &str) -> bool {
        self.readings.iter().any(|reading| reading.name == name)
    }
}

impl Reading {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }
}
