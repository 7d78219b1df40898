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

//! Startup snapshot of the registration registry.

use crate::error::RegistryError;
use crate::observability::events;
use crate::registration::Registration;
use crate::registry::RegistrationRegistry;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const COMPONENT: &str = "registry_bootstrap";

/// Fetches every registration, retrying on a fixed interval.
///
/// Returns `None` once `shutdown` fires before a snapshot was obtained.
pub(crate) async fn fetch_initial_registrations(
    distro_name: &str,
    registry: &dyn RegistrationRegistry,
    retry_interval: Duration,
    shutdown: &CancellationToken,
) -> Option<Vec<Registration>> {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;

        let fetched: Result<Vec<Registration>, RegistryError> = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return None,
            fetched = registry.fetch_registrations() => fetched,
        };

        match fetched {
            Ok(registrations) => {
                info!(
                    event = events::REGISTRY_FETCH_OK,
                    component = COMPONENT,
                    distro = distro_name,
                    attempt,
                    count = registrations.len(),
                    "registration snapshot fetched"
                );
                return Some(registrations);
            }
            Err(err) => {
                warn!(
                    event = events::REGISTRY_FETCH_RETRY,
                    component = COMPONENT,
                    distro = distro_name,
                    attempt,
                    retry_in_ms = retry_interval.as_millis() as u64,
                    err = %err,
                    "registry unavailable; retrying"
                );
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(retry_interval) => {}
        }
    }
}
