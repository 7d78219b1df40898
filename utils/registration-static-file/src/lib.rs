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

//! File-backed [`RegistrationRegistry`].
//!
//! The file holds a JSON5 array of registrations. It is re-read on every call, so
//! edits show up on the next startup snapshot or change notification.

use async_trait::async_trait;
use export_distro::observability::events;
use export_distro::{Registration, RegistrationRegistry, RegistryError};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const COMPONENT: &str = "registration_static_file";

pub struct RegistrationStaticFile {
    static_file: PathBuf,
}

impl RegistrationStaticFile {
    pub fn new(static_file: impl Into<PathBuf>) -> Self {
        Self {
            static_file: static_file.into(),
        }
    }

    fn load(&self) -> Result<Vec<Registration>, RegistryError> {
        let data = fs::read_to_string(&self.static_file).map_err(|err| {
            RegistryError::Unavailable(format!(
                "unable to read {}: {err}",
                self.static_file.display()
            ))
        })?;

        let registrations: Vec<Registration> = json5::from_str(&data).map_err(|err| {
            RegistryError::Malformed(format!(
                "unable to parse {}: {err}",
                self.static_file.display()
            ))
        })?;

        debug!(
            event = events::REGISTRY_FILE_LOADED,
            component = COMPONENT,
            path = %self.static_file.display(),
            registrations = registrations.len(),
            "loaded static registrations"
        );
        Ok(registrations)
    }
}

#[async_trait]
impl RegistrationRegistry for RegistrationStaticFile {
    async fn fetch_registrations(&self) -> Result<Vec<Registration>, RegistryError> {
        self.load()
    }

    async fn fetch_registration(&self, name: &str) -> Result<Option<Registration>, RegistryError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|registration| registration.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::RegistrationStaticFile;
    use export_distro::{RegistrationRegistry, RegistryError};
    use std::path::PathBuf;

    fn testdata() -> RegistrationStaticFile {
        RegistrationStaticFile::new(
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static-configs/testdata.json5"),
        )
    }

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "registration-static-file-{}-{name}.json5",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("scratch file should be writable");
        path
    }

    #[tokio::test]
    async fn fetch_registrations_reads_every_entry() {
        let registrations = testdata()
            .fetch_registrations()
            .await
            .expect("testdata should load");

        let names: Vec<&str> = registrations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["r1", "telemetry-mqtt", "paused"]);

        assert_eq!(registrations[0].compression, "GZIP");
        assert_eq!(registrations[0].filter.device_ids, ["devA"]);
        assert_eq!(registrations[1].addressable.qos, 1);
        assert_eq!(registrations[1].addressable.topic, "edge/telemetry");
        assert!(!registrations[2].enable);
    }

    #[tokio::test]
    async fn fetch_registration_looks_up_by_name() {
        let registry = testdata();

        let found = registry
            .fetch_registration("telemetry-mqtt")
            .await
            .expect("testdata should load")
            .expect("registration should exist");
        assert_eq!(found.destination, "MQTT_TOPIC");

        let missing = registry
            .fetch_registration("ghost")
            .await
            .expect("testdata should load");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let registry = RegistrationStaticFile::new("/nonexistent/registrations.json5");

        let error = registry
            .fetch_registrations()
            .await
            .expect_err("missing file should fail");

        assert!(matches!(error, RegistryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unparsable_file_is_malformed() {
        let path = scratch_file("broken", "[{ name: ");
        let registry = RegistrationStaticFile::new(&path);

        let error = registry
            .fetch_registration("r1")
            .await
            .expect_err("broken file should fail");

        assert!(matches!(error, RegistryError::Malformed(_)));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn edits_are_visible_on_the_next_fetch() {
        let path = scratch_file("edited", r#"[{ name: "a" }]"#);
        let registry = RegistrationStaticFile::new(&path);
        assert_eq!(
            registry.fetch_registrations().await.expect("first load").len(),
            1
        );

        std::fs::write(&path, r#"[{ name: "a" }, { name: "b" }]"#).expect("rewrite");

        assert!(registry
            .fetch_registration("b")
            .await
            .expect("second load")
            .is_some());
        let _ = std::fs::remove_file(path);
    }
}
