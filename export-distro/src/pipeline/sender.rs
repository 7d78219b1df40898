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

//! Destination senders and the factory seam that builds them.

use crate::error::{CompileError, SendError};
use crate::observability::events;
use crate::registration::{Addressable, Registration};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use rumqttc::{AsyncClient, ConnectionError, EventLoop, MqttOptions, QoS};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "sender";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MQTT_PORT: u16 = 1883;
const MQTT_REQUEST_CAPACITY: usize = 64;
const MQTT_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_MQTT_QOS: u8 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Destination {
    Rest,
    Mqtt,
}

impl FromStr for Destination {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REST_ENDPOINT" => Ok(Destination::Rest),
            "MQTT_TOPIC" | "AZURE_MQTT" => Ok(Destination::Mqtt),
            other => Err(CompileError::unsupported("destination", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl FromStr for HttpMethod {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("GET") {
            Ok(HttpMethod::Get)
        } else if value.eq_ignore_ascii_case("POST") {
            Ok(HttpMethod::Post)
        } else {
            Err(CompileError::unsupported("addressable.method", value))
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpTarget {
    pub url: String,
    pub method: HttpMethod,
    pub content_type: &'static str,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MqttTarget {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub user: String,
    pub password: String,
    pub topic: String,
    pub qos: u8,
    pub retained: bool,
    pub keep_alive: Duration,
    pub auto_reconnect: bool,
    pub connect_timeout: Duration,
}

/// Fully validated destination address handed to a [`SenderFactory`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SenderTarget {
    Http(HttpTarget),
    Mqtt(MqttTarget),
}

impl SenderTarget {
    pub(crate) fn resolve(
        destination: Destination,
        addressable: &Addressable,
        content_type: &'static str,
    ) -> Result<Self, CompileError> {
        if addressable.address.is_empty() {
            return Err(CompileError::Invalid {
                field: "addressable.address",
                reason: "address is empty".to_string(),
            });
        }

        match destination {
            Destination::Rest => {
                let protocol = addressable.protocol.to_ascii_lowercase();
                if protocol != "http" && protocol != "https" {
                    return Err(CompileError::unsupported(
                        "addressable.protocol",
                        &addressable.protocol,
                    ));
                }

                Ok(SenderTarget::Http(HttpTarget {
                    url: addressable.url(),
                    method: addressable.method.parse()?,
                    content_type,
                }))
            }
            Destination::Mqtt => {
                if addressable.topic.is_empty() {
                    return Err(CompileError::Invalid {
                        field: "addressable.topic",
                        reason: "topic is empty".to_string(),
                    });
                }
                if addressable.qos > MAX_MQTT_QOS {
                    return Err(CompileError::Invalid {
                        field: "addressable.qos",
                        reason: format!("qos {} is above {MAX_MQTT_QOS}", addressable.qos),
                    });
                }
                if addressable.connect_timeout == 0 {
                    return Err(CompileError::Invalid {
                        field: "addressable.connectTimeout",
                        reason: "connect timeout must be at least one second".to_string(),
                    });
                }

                let client_id = match addressable.publisher.trim() {
                    "" => format!("export-distro-{}", Uuid::new_v4().simple()),
                    publisher => publisher.to_string(),
                };

                Ok(SenderTarget::Mqtt(MqttTarget {
                    host: addressable.address.clone(),
                    port: match addressable.port {
                        0 => DEFAULT_MQTT_PORT,
                        port => port,
                    },
                    client_id,
                    user: addressable.user.clone(),
                    password: addressable.password.clone(),
                    topic: addressable.topic.clone(),
                    qos: addressable.qos,
                    retained: addressable.retained,
                    keep_alive: Duration::from_secs(addressable.keep_alive),
                    auto_reconnect: addressable.auto_reconnect,
                    connect_timeout: Duration::from_secs(addressable.connect_timeout),
                }))
            }
        }
    }
}

/// Delivers one payload to one external destination, best effort.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, payload: Vec<u8>) -> Result<(), SendError>;
}

/// Builds the sender for a compiled pipeline.
///
/// The production factory opens real HTTP/MQTT clients; tests swap in recording stubs.
pub trait SenderFactory: Send + Sync {
    fn build_sender(
        &self,
        registration: &Registration,
        target: SenderTarget,
    ) -> Result<Arc<dyn Sender>, CompileError>;
}

pub struct TransportSenderFactory {
    http_timeout: Duration,
}

impl TransportSenderFactory {
    pub fn new(http_timeout: Duration) -> Self {
        Self { http_timeout }
    }
}

impl Default for TransportSenderFactory {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl SenderFactory for TransportSenderFactory {
    fn build_sender(
        &self,
        registration: &Registration,
        target: SenderTarget,
    ) -> Result<Arc<dyn Sender>, CompileError> {
        match target {
            SenderTarget::Http(target) => Ok(Arc::new(HttpSender::new(target, self.http_timeout)?)),
            SenderTarget::Mqtt(target) => Ok(Arc::new(MqttSender::new(&registration.name, target))),
        }
    }
}

pub struct HttpSender {
    client: reqwest::Client,
    target: HttpTarget,
}

impl HttpSender {
    pub fn new(target: HttpTarget, timeout: Duration) -> Result<Self, CompileError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CompileError::Invalid {
                field: "addressable",
                reason: format!("http client for {}: {err}", target.url),
            })?;

        Ok(Self { client, target })
    }
}

#[async_trait]
impl Sender for HttpSender {
    async fn send(&self, payload: Vec<u8>) -> Result<(), SendError> {
        let request = match self.target.method {
            HttpMethod::Get => self.client.get(&self.target.url),
            HttpMethod::Post => self
                .client
                .post(&self.target.url)
                .header(CONTENT_TYPE, self.target.content_type)
                .body(payload),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status(status.as_u16()));
        }

        Ok(())
    }
}

/// Publishes to one topic. The client event loop is started on the first send and
/// stopped when the sender is dropped.
pub struct MqttSender {
    registration: String,
    client: AsyncClient,
    topic: String,
    qos: QoS,
    retained: bool,
    auto_reconnect: bool,
    pending_eventloop: Mutex<Option<EventLoop>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl MqttSender {
    pub fn new(registration: &str, target: MqttTarget) -> Self {
        let mut options = MqttOptions::new(target.client_id, target.host, target.port);
        options.set_keep_alive(target.keep_alive);
        if !target.user.is_empty() {
            options.set_credentials(target.user, target.password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, MQTT_REQUEST_CAPACITY);
        eventloop
            .network_options
            .set_connection_timeout(target.connect_timeout.as_secs());

        Self {
            registration: registration.to_string(),
            client,
            topic: target.topic,
            qos: qos_level(target.qos),
            retained: target.retained,
            auto_reconnect: target.auto_reconnect,
            pending_eventloop: Mutex::new(Some(eventloop)),
            driver: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn driver_finished(&self) -> bool {
        self.driver
            .lock()
            .map(|driver| driver.as_ref().is_some_and(|handle| handle.is_finished()))
            .unwrap_or(false)
    }

    fn ensure_driver(&self) {
        let Some(eventloop) = self
            .pending_eventloop
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
        else {
            return;
        };

        let handle = tokio::spawn(drive_eventloop(
            eventloop,
            self.registration.clone(),
            self.auto_reconnect,
        ));
        if let Ok(mut driver) = self.driver.lock() {
            *driver = Some(handle);
        }
    }
}

impl Drop for MqttSender {
    fn drop(&mut self) {
        if let Ok(mut driver) = self.driver.lock() {
            if let Some(handle) = driver.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl Sender for MqttSender {
    async fn send(&self, payload: Vec<u8>) -> Result<(), SendError> {
        self.ensure_driver();
        self.client
            .try_publish(self.topic.as_str(), self.qos, self.retained, payload)?;
        Ok(())
    }
}

fn qos_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

async fn drive_eventloop(mut eventloop: EventLoop, registration: String, auto_reconnect: bool) {
    loop {
        match eventloop.poll().await {
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                debug!(
                    event = events::MQTT_CONNECTION_ERROR,
                    component = COMPONENT,
                    registration = registration.as_str(),
                    "mqtt client dropped; stopping event loop"
                );
                break;
            }
            Err(err) => {
                warn!(
                    event = events::MQTT_CONNECTION_ERROR,
                    component = COMPONENT,
                    registration = registration.as_str(),
                    auto_reconnect,
                    err = %err,
                    "mqtt connection error"
                );
                if !auto_reconnect {
                    break;
                }
                tokio::time::sleep(MQTT_RECONNECT_DELAY).await;
            }
        }
    }
}
