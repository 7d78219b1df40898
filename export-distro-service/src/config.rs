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

use anyhow::Context;
use export_distro::DistroConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) distro: DistroSection,
    pub(crate) registry: RegistrySection,
    pub(crate) ingress: IngressSection,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DistroSection {
    pub(crate) event_queue_size: usize,
    pub(crate) registry_retry_interval_ms: u64,
    pub(crate) http_timeout_ms: u64,
    #[serde(default = "default_shutdown_grace_ms")]
    pub(crate) shutdown_grace_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    pub(crate) file_path: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct IngressSection {
    pub(crate) event_listen_address: String,
    pub(crate) notification_listen_address: String,
}

fn default_shutdown_grace_ms() -> u64 {
    DistroConfig::default().shutdown_grace.as_millis() as u64
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = json5::from_str(contents)?;
        anyhow::ensure!(
            config.distro.event_queue_size > 0,
            "distro.event_queue_size must be at least 1"
        );
        Ok(config)
    }
}

impl From<&DistroSection> for DistroConfig {
    fn from(section: &DistroSection) -> Self {
        DistroConfig {
            event_queue_size: section.event_queue_size,
            registry_retry_interval: Duration::from_millis(section.registry_retry_interval_ms),
            shutdown_grace: Duration::from_millis(section.shutdown_grace_ms),
            http_timeout: Duration::from_millis(section.http_timeout_ms),
        }
    }
}
