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

//! Test doubles and helpers shared by the workspace integration tests.

mod builders;
pub use builders::{event, mqtt_registration, rest_registration};
mod http_stub;
pub use http_stub::{CapturedRequest, HttpStub};
mod registry;
pub use registry::InMemoryRegistry;
mod senders;
pub use senders::{FailingSender, GatedSender, RecordingSender, StubSenderFactory};

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs a `fmt` subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
