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

//! Runtime helper for spawning and joining registration worker tasks.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JoinOutcome {
    Finished,
    Panicked,
    /// The task outlived the grace period and was aborted.
    TimedOut,
}

pub(crate) fn spawn_registration_loop<F>(registration_loop: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(registration_loop)
}

pub(crate) async fn join_with_timeout(handle: JoinHandle<()>, grace: Duration) -> JoinOutcome {
    let abort_handle = handle.abort_handle();

    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(())) => JoinOutcome::Finished,
        Ok(Err(err)) if err.is_panic() => JoinOutcome::Panicked,
        Ok(Err(_)) => JoinOutcome::Finished,
        Err(_) => {
            abort_handle.abort();
            JoinOutcome::TimedOut
        }
    }
}
