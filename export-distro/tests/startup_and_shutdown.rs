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

mod support;

use export_distro::{DistroError, Sender};
use integration_test_utils::{
    event, rest_registration, GatedSender, InMemoryRegistry, StubSenderFactory,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use support::{start_distro, test_config, WAIT};

#[tokio::test(flavor = "multi_thread")]
async fn startup_retries_until_registry_is_available() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([rest_registration("r1", &[])]));
    registry.fail_next_fetches(3);
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("startup-retry", test_config(16), registry.clone(), factory.clone());

    distro.publish(event("devA", &[("temperature", "20")])).await;

    assert!(factory.recorder("r1").wait_for(1, WAIT).await);
    distro.stop().await.expect("clean shutdown");
    assert_eq!(registry.fetch_calls(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_during_startup_aborts_cleanly() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::default());
    registry.fail_next_fetches(usize::MAX);
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("startup-abort", test_config(16), registry.clone(), factory);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let result = distro.stop().await;

    assert!(matches!(result, Err(DistroError::ShutdownDuringStartup)));
    assert!(registry.fetch_calls() >= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_workers_even_with_a_stuck_destination() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([
        rest_registration("stuck", &[]),
        rest_registration("idle", &[]),
    ]));
    let factory = Arc::new(StubSenderFactory::default());
    let gated = Arc::new(GatedSender::default());
    let gated_sender: Arc<dyn Sender> = gated.clone();
    factory.install("stuck", gated_sender);
    let config = test_config(16);
    let grace = config.shutdown_grace;
    let distro = start_distro("shutdown", config, registry, factory.clone());

    distro.publish(event("devA", &[("temperature", "20")])).await;
    assert!(gated.wait_entered(1, WAIT).await);
    assert!(factory.recorder("idle").wait_for(1, WAIT).await);

    let started = Instant::now();
    distro.stop().await.expect("shutdown should succeed");

    assert!(started.elapsed() < grace + Duration::from_secs(2));
    assert_eq!(gated.recorder().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn full_worker_queue_drops_events_for_that_worker_only() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([
        rest_registration("slow", &[]),
        rest_registration("fast", &[]),
    ]));
    let factory = Arc::new(StubSenderFactory::default());
    let gated = Arc::new(GatedSender::default());
    let gated_sender: Arc<dyn Sender> = gated.clone();
    factory.install("slow", gated_sender);
    let distro = start_distro("backpressure", test_config(2), registry, factory.clone());

    distro.publish(event("devA", &[("seq", "0")])).await;
    assert!(gated.wait_entered(1, WAIT).await);
    for seq in 1..=5 {
        distro
            .publish(event("devA", &[("seq", &seq.to_string())]))
            .await;
        // paced so only the gated worker falls behind
        assert!(factory.recorder("fast").wait_for(seq + 1, WAIT).await);
    }

    assert!(factory.recorder("fast").wait_for(6, WAIT).await);
    gated.release(16);
    assert!(gated.recorder().wait_for(3, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    distro.stop().await.expect("clean shutdown");

    // one event in flight plus a queue of two; the rest were dropped
    assert_eq!(gated.recorder().count(), 3);
    assert_eq!(factory.recorder("fast").count(), 6);
}
