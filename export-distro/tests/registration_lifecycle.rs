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

use export_distro::{Event, NotifyUpdate, Sender, SenderTarget};
use integration_test_utils::{
    event, mqtt_registration, rest_registration, GatedSender, InMemoryRegistry,
    StubSenderFactory,
};
use std::sync::Arc;
use std::time::Duration;
use support::{start_distro, test_config, WAIT};

#[tokio::test(flavor = "multi_thread")]
async fn registration_added_at_runtime_starts_receiving() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::default());
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("runtime-add", test_config(16), registry.clone(), factory.clone());

    distro.publish(event("devA", &[("temperature", "20")])).await;

    registry.upsert(rest_registration("late", &[]));
    distro.notify(NotifyUpdate::add("late")).await;
    distro.publish(event("devA", &[("temperature", "21")])).await;

    let recorder = factory.recorder("late");
    assert!(recorder.wait_for(1, WAIT).await);
    distro.stop().await.expect("clean shutdown");

    let received: Event =
        serde_json::from_slice(&recorder.payloads()[0]).expect("json payload");
    assert_eq!(received.readings[0].value, "21", "events before the add are not replayed");
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_registration_receives_nothing_further() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([
        rest_registration("gone", &[]),
        rest_registration("kept", &[]),
    ]));
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("teardown", test_config(16), registry, factory.clone());

    distro.publish(event("devA", &[("temperature", "20")])).await;
    assert!(factory.recorder("gone").wait_for(1, WAIT).await);

    distro.notify(NotifyUpdate::delete("gone")).await;
    for _ in 0..3 {
        distro.publish(event("devA", &[("temperature", "21")])).await;
    }

    assert!(factory.recorder("kept").wait_for(4, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    distro.stop().await.expect("clean shutdown");

    assert_eq!(factory.recorder("gone").count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn reconfiguration_applies_between_events() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([rest_registration("r1", &[])]));
    let factory = Arc::new(StubSenderFactory::default());
    let gated = Arc::new(GatedSender::default());
    let gated_sender: Arc<dyn Sender> = gated.clone();
    factory.install("r1", gated_sender);
    let distro = start_distro("reconfigure", test_config(16), registry.clone(), factory);

    // E1 parks inside the sender under the JSON pipeline
    distro.publish(event("devA", &[("temperature", "1")])).await;
    assert!(gated.wait_entered(1, WAIT).await);

    let mut xml = rest_registration("r1", &[]);
    xml.format = "XML".to_string();
    registry.upsert(xml);
    distro.notify(NotifyUpdate::update("r1")).await;
    distro.publish(event("devA", &[("temperature", "2")])).await;

    gated.release(2);
    assert!(gated.recorder().wait_for(2, WAIT).await);
    distro.stop().await.expect("clean shutdown");

    let payloads = gated.recorder().payloads();
    let first: Event = serde_json::from_slice(&payloads[0]).expect("E1 keeps the old format");
    assert_eq!(first.readings[0].value, "1");
    let second = String::from_utf8(payloads[1].clone()).expect("xml is utf-8");
    assert!(second.starts_with("<Event>"), "E2 uses the new format: {second}");
    assert!(second.contains("<value>2</value>"), "{second}");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_does_not_overtake_events_already_queued() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([rest_registration("r1", &[])]));
    let factory = Arc::new(StubSenderFactory::default());
    let gated = Arc::new(GatedSender::default());
    let gated_sender: Arc<dyn Sender> = gated.clone();
    factory.install("r1", gated_sender);
    let distro = start_distro("queued-update", test_config(16), registry.clone(), factory);

    distro.publish(event("devA", &[("temperature", "0")])).await;
    assert!(gated.wait_entered(1, WAIT).await);
    // E1 sits in the worker queue behind the parked E0
    distro.publish(event("devA", &[("temperature", "1")])).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut xml = rest_registration("r1", &[]);
    xml.format = "XML".to_string();
    registry.upsert(xml);
    distro.notify(NotifyUpdate::update("r1")).await;
    distro.publish(event("devA", &[("temperature", "2")])).await;

    gated.release(3);
    assert!(gated.recorder().wait_for(3, WAIT).await);
    distro.stop().await.expect("clean shutdown");

    let payloads = gated.recorder().payloads();
    for (index, expected) in ["0", "1"].into_iter().enumerate() {
        let queued: Event =
            serde_json::from_slice(&payloads[index]).expect("queued events keep the old format");
        assert_eq!(queued.readings[0].value, expected);
    }
    let last = String::from_utf8(payloads[2].clone()).expect("xml is utf-8");
    assert!(last.starts_with("<Event>"), "E2 uses the new format: {last}");
    assert!(last.contains("<value>2</value>"), "{last}");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_that_fails_to_compile_removes_destination() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([rest_registration("r1", &[])]));
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("broken-update", test_config(16), registry.clone(), factory.clone());

    distro.publish(event("devA", &[("temperature", "1")])).await;
    assert!(factory.recorder("r1").wait_for(1, WAIT).await);

    let mut broken = rest_registration("r1", &[]);
    broken.addressable.method = "PATCH".to_string();
    registry.upsert(broken);
    distro.notify(NotifyUpdate::update("r1")).await;

    distro.publish(event("devA", &[("temperature", "2")])).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(factory.recorder("r1").count(), 1);

    // the removed entry frees the name for a corrected registration
    registry.upsert(rest_registration("r1", &[]));
    distro.notify(NotifyUpdate::add("r1")).await;
    distro.publish(event("devA", &[("temperature", "3")])).await;
    assert!(factory.recorder("r1").wait_for(2, WAIT).await);

    distro.stop().await.expect("clean shutdown");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_for_a_name_missing_from_registry_keeps_current_pipeline() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::with([rest_registration("r1", &[])]));
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("missing-update", test_config(16), registry.clone(), factory.clone());

    distro.publish(event("devA", &[("temperature", "1")])).await;
    assert!(factory.recorder("r1").wait_for(1, WAIT).await);

    registry.remove("r1");
    distro.notify(NotifyUpdate::update("r1")).await;
    distro.publish(event("devA", &[("temperature", "2")])).await;

    assert!(factory.recorder("r1").wait_for(2, WAIT).await);
    distro.stop().await.expect("clean shutdown");
    assert_eq!(factory.targets("r1").len(), 1, "no recompile happened");
}

#[tokio::test(flavor = "multi_thread")]
async fn mqtt_registration_added_at_runtime_targets_its_topic() {
    integration_test_utils::init_logging();
    let registry = Arc::new(InMemoryRegistry::default());
    let factory = Arc::new(StubSenderFactory::default());
    let distro = start_distro("mqtt-add", test_config(16), registry.clone(), factory.clone());

    registry.upsert(mqtt_registration("telemetry", "edge/telemetry"));
    distro.notify(NotifyUpdate::add("telemetry")).await;
    distro.publish(event("devA", &[("temperature", "1")])).await;

    assert!(factory.recorder("telemetry").wait_for(1, WAIT).await);
    distro.stop().await.expect("clean shutdown");

    match factory.targets("telemetry").as_slice() {
        [SenderTarget::Mqtt(target)] => {
            assert_eq!(target.topic, "edge/telemetry");
            assert_eq!(target.host, "broker.local");
            assert_eq!(target.port, 1883);
            assert_eq!(target.client_id, "telemetry-publisher");
        }
        other => panic!("unexpected targets: {other:?}"),
    }
}
