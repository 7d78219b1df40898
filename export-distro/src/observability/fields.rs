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

//! Field values and value-format helpers shared by log call sites.
//!
//! Every event carries `event` and `component`. Worker events add `worker_id` and
//! `registration`; pipeline events add `device` and `event_id`.

use crate::event::Event;

pub const NONE: &str = "none";
pub const REASON_DELETED: &str = "deleted";
pub const REASON_COMPILE_FAILED: &str = "compile_failed";
pub const REASON_CHANNEL_CLOSED: &str = "channel_closed";
pub const REASON_SHUTDOWN: &str = "shutdown";

/// Identity carried on every worker log line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerContext {
    pub worker_id: String,
    pub registration: String,
}

impl WorkerContext {
    pub fn new(worker_id: impl Into<String>, registration: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            registration: registration.into(),
        }
    }
}

pub fn format_event_id(event: &Event) -> String {
    if event.id.is_empty() {
        NONE.to_string()
    } else {
        event.id.clone()
    }
}

pub fn format_field(field: Option<&'static str>) -> &'static str {
    field.unwrap_or(NONE)
}
