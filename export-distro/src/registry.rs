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

//! Source of registration descriptors.

use crate::error::RegistryError;
use crate::registration::Registration;
use async_trait::async_trait;

/// Read side of the registration registry.
///
/// `fetch_registrations` provides the startup snapshot; `fetch_registration` is used to
/// re-read one descriptor after an add or update notification. A registration the
/// registry does not know is `Ok(None)`, not an error.
#[async_trait]
pub trait RegistrationRegistry: Send + Sync {
    async fn fetch_registrations(&self) -> Result<Vec<Registration>, RegistryError>;

    async fn fetch_registration(&self, name: &str) -> Result<Option<Registration>, RegistryError>;
}
