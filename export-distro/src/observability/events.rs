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

//! Canonical structured event names used across `export-distro`.

// Dispatch loop and startup events.
pub const DISTRO_START: &str = "distro_start";
pub const DISTRO_STOP: &str = "distro_stop";
pub const REGISTRY_FETCH_OK: &str = "registry_fetch_ok";
pub const REGISTRY_FETCH_RETRY: &str = "registry_fetch_retry";
pub const WORKERS_STARTED: &str = "workers_started";
pub const STARTUP_ABORTED: &str = "startup_aborted";
pub const UPSTREAM_CLOSED: &str = "upstream_closed";
pub const NOTIFY_CHANNEL_CLOSED: &str = "notify_channel_closed";
pub const SHUTDOWN_START: &str = "shutdown_start";
pub const SHUTDOWN_WORKER_TIMEOUT: &str = "shutdown_worker_timeout";

// Control-plane lifecycle events.
pub const NOTIFY_APPLY_START: &str = "notify_apply_start";
pub const NOTIFY_APPLY_OK: &str = "notify_apply_ok";
pub const NOTIFY_APPLY_FAILED: &str = "notify_apply_failed";
pub const WORKER_PURGED: &str = "worker_purged";

// Registration worker events.
pub const WORKER_CREATE: &str = "worker_create";
pub const WORKER_CREATE_FAILED: &str = "worker_create_failed";
pub const WORKER_RECONFIGURE_OK: &str = "worker_reconfigure_ok";
pub const WORKER_RECONFIGURE_FAILED: &str = "worker_reconfigure_failed";
pub const WORKER_TERMINATE: &str = "worker_terminate";
pub const WORKER_QUEUE_FULL: &str = "worker_queue_full";
pub const FANOUT_PARTIAL: &str = "fanout_partial";

// Pipeline events.
pub const EVENT_FILTERED: &str = "event_filtered";
pub const FORMAT_FAILED: &str = "format_failed";
pub const TRANSFORM_FAILED: &str = "transform_failed";
pub const SEND_ATTEMPT: &str = "send_attempt";
pub const SEND_OK: &str = "send_ok";
pub const SEND_FAILED: &str = "send_failed";
pub const MQTT_CONNECTION_ERROR: &str = "mqtt_connection_error";

// Ingress events.
pub const INGRESS_DECODE_FAILED: &str = "ingress_decode_failed";
pub const INGRESS_FORWARD_FAILED: &str = "ingress_forward_failed";
pub const INGRESS_CLOSED: &str = "ingress_closed";
pub const INGRESS_LISTENING: &str = "ingress_listening";
pub const INGRESS_CONNECTION_ACCEPTED: &str = "ingress_connection_accepted";
pub const INGRESS_ACCEPT_FAILED: &str = "ingress_accept_failed";
pub const INGRESS_READ_FAILED: &str = "ingress_read_failed";
pub const INGRESS_LISTENER_FAILED: &str = "ingress_listener_failed";

// Registry backends and service process events.
pub const REGISTRY_FILE_LOADED: &str = "registry_file_loaded";
pub const SERVICE_CONFIG_LOADED: &str = "service_config_loaded";
pub const SERVICE_SHUTDOWN_SIGNAL: &str = "service_shutdown_signal";
