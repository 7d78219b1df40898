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

use export_distro::{Event, Reading, Registration};
use std::sync::Arc;

/// JSON over HTTP POST to `http://x/y`, optionally limited to `device_ids`.
pub fn rest_registration(name: &str, device_ids: &[&str]) -> Registration {
    let mut registration = Registration::new(name);
    registration.format = "JSON".to_string();
    registration.destination = "REST_ENDPOINT".to_string();
    registration.addressable.protocol = "HTTP".to_string();
    registration.addressable.address = "x".to_string();
    registration.addressable.path = "/y".to_string();
    registration.addressable.method = "POST".to_string();
    registration.filter.device_ids = device_ids.iter().map(|id| id.to_string()).collect();
    registration
}

pub fn mqtt_registration(name: &str, topic: &str) -> Registration {
    let mut registration = Registration::new(name);
    registration.format = "JSON".to_string();
    registration.destination = "MQTT_TOPIC".to_string();
    registration.addressable.address = "broker.local".to_string();
    registration.addressable.publisher = format!("{name}-publisher");
    registration.addressable.topic = topic.to_string();
    registration
}

/// Event for `device` with `(name, value)` readings.
pub fn event(device: &str, readings: &[(&str, &str)]) -> Arc<Event> {
    let event = readings
        .iter()
        .fold(Event::new(device, 1_700_000_000_000), |event, (name, value)| {
            event.with_reading(Reading::new(name, value))
        });
    Arc::new(event)
}
