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

//! Data-plane layer.
//!
//! One registration worker per active registration. Each worker owns its compiled
//! pipeline, a bounded event queue and an unbounded reconfiguration queue, and runs the
//! pipeline stages sequentially on its own task.

pub(crate) mod registration_worker;
