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

//! Wire formats an event can be serialized into.

use crate::error::CompileError;
use crate::event::Event;
use crate::observability::events;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use tracing::error;
use uuid::Uuid;

const COMPONENT: &str = "formatter";
const XML_ROOT: &str = "Event";

/// Closed set of supported formats, resolved once per pipeline compile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Json,
    Xml,
    IotCoreJson,
    ThingsBoardJson,
    AwsJson,
    AzureJson,
    Noop,
}

impl FromStr for Format {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "JSON" => Ok(Format::Json),
            "XML" => Ok(Format::Xml),
            "IOTCORE_JSON" => Ok(Format::IotCoreJson),
            "THINGSBOARD_JSON" => Ok(Format::ThingsBoardJson),
            "AWS_JSON" => Ok(Format::AwsJson),
            "AZURE_JSON" => Ok(Format::AzureJson),
            "NOOP" => Ok(Format::Noop),
            other => Err(CompileError::unsupported("format", other)),
        }
    }
}

impl Format {
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            Format::Json | Format::IotCoreJson => Box::new(JsonFormatter),
            Format::Xml => Box::new(XmlFormatter),
            Format::ThingsBoardJson => Box::new(ThingsBoardJsonFormatter),
            Format::AwsJson => Box::new(AwsShadowFormatter),
            Format::AzureJson => Box::new(AzureMessageFormatter),
            Format::Noop => Box::new(NoopFormatter),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Xml => "application/xml",
            Format::Noop => "application/octet-stream",
            _ => "application/json",
        }
    }
}

/// Serializes an event. Total and side-effect free: a serializer failure is logged and
/// yields an empty body.
pub trait Formatter: Send + Sync {
    fn format(&self, event: &Event) -> Vec<u8>;
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, event: &Event) -> Vec<u8> {
        serde_json::to_vec(event).unwrap_or_else(|err| {
            error!(
                event = events::FORMAT_FAILED,
                component = COMPONENT,
                format = "JSON",
                device = event.device.as_str(),
                err = %err,
                "unable to serialize event"
            );
            Vec::new()
        })
    }
}

#[derive(Serialize)]
struct XmlTag<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct XmlReading<'a> {
    name: &'a str,
    value: &'a str,
    origin: i64,
}

// Tag keys are free-form, so they go out as name/value elements instead of element names.
#[derive(Serialize)]
struct XmlEvent<'a> {
    #[serde(skip_serializing_if = "is_blank")]
    id: &'a str,
    device: &'a str,
    origin: i64,
    readings: Vec<XmlReading<'a>>,
    tags: Vec<XmlTag<'a>>,
}

fn is_blank(value: &&str) -> bool {
    value.is_empty()
}

impl<'a> XmlEvent<'a> {
    fn from_event(event: &'a Event) -> Self {
        Self {
            id: &event.id,
            device: &event.device,
            origin: event.origin,
            readings: event
                .readings
                .iter()
                .map(|reading| XmlReading {
                    name: &reading.name,
                    value: &reading.value,
                    origin: reading.origin,
                })
                .collect(),
            tags: event
                .tags
                .iter()
                .map(|(name, value)| XmlTag { name, value })
                .collect(),
        }
    }
}

pub struct XmlFormatter;

impl Formatter for XmlFormatter {
    fn format(&self, event: &Event) -> Vec<u8> {
        match quick_xml::se::to_string_with_root(XML_ROOT, &XmlEvent::from_event(event)) {
            Ok(document) => document.into_bytes(),
            Err(err) => {
                error!(
                    event = events::FORMAT_FAILED,
                    component = COMPONENT,
                    format = "XML",
                    device = event.device.as_str(),
                    err = %err,
                    "unable to serialize event"
                );
                Vec::new()
            }
        }
    }
}

/// `{"<device>": [{"ts": origin, "values": {"<reading>": "<value>"}}]}`
pub struct ThingsBoardJsonFormatter;

impl Formatter for ThingsBoardJsonFormatter {
    fn format(&self, event: &Event) -> Vec<u8> {
        let values: Map<String, Value> = event
            .readings
            .iter()
            .map(|reading| (reading.name.clone(), Value::from(reading.value.clone())))
            .collect();

        let mut document = Map::new();
        document.insert(
            event.device.clone(),
            json!([{ "ts": event.origin, "values": values }]),
        );

        Value::Object(document).to_string().into_bytes()
    }
}

/// Device shadow document, readings coerced to numbers or booleans when they parse.
pub struct AwsShadowFormatter;

impl AwsShadowFormatter {
    fn coerce(value: &str) -> Value {
        if let Ok(number) = value.parse::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(number) {
                return Value::Number(number);
            }
        }

        match value.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::from(value),
        }
    }
}

impl Formatter for AwsShadowFormatter {
    fn format(&self, event: &Event) -> Vec<u8> {
        let reported: Map<String, Value> = event
            .readings
            .iter()
            .map(|reading| (reading.name.clone(), Self::coerce(&reading.value)))
            .collect();

        json!({ "state": { "reported": reported } })
            .to_string()
            .into_bytes()
    }
}

/// IoT Hub message envelope. `body` is the JSON event, base64 encoded; `id` and
/// `CorrelationId` are fresh per message.
pub struct AzureMessageFormatter;

#[derive(Serialize)]
struct AzureMessage<'a> {
    id: String,
    #[serde(rename = "sequenceNumber")]
    sequence_number: i64,
    #[serde(rename = "CorrelationId")]
    correlation_id: String,
    #[serde(rename = "userId")]
    user_id: String,
    ack: u8,
    #[serde(rename = "connectionDeviceId")]
    connection_device_id: &'a str,
    body: String,
    properties: Map<String, Value>,
}

impl Formatter for AzureMessageFormatter {
    fn format(&self, event: &Event) -> Vec<u8> {
        let body = JsonFormatter.format(event);
        if body.is_empty() {
            return body;
        }

        let message = AzureMessage {
            id: Uuid::new_v4().to_string(),
            sequence_number: 0,
            correlation_id: Uuid::new_v4().to_string(),
            user_id: event.origin.to_string(),
            ack: 0,
            connection_device_id: &event.device,
            body: STANDARD.encode(body),
            properties: Map::new(),
        };

        serde_json::to_vec(&message).unwrap_or_else(|err| {
            error!(
                event = events::FORMAT_FAILED,
                component = COMPONENT,
                format = "AZURE_JSON",
                device = event.device.as_str(),
                err = %err,
                "unable to serialize azure message"
            );
            Vec::new()
        })
    }
}

pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, _event: &Event) -> Vec<u8> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Format;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use crate::error::CompileError;
    use crate::event::{Event, Reading};
    use serde_json::Value;

    fn sample_event() -> Event {
        Event::new("devA", 1000)
            .with_reading(Reading::new("temperature", "21.5"))
            .with_reading(Reading::new("door_open", "TRUE"))
            .with_reading(Reading::new("label", "kitchen"))
    }

    #[test]
    fn parse_rejects_formats_outside_the_closed_set() {
        assert_eq!("JSON".parse::<Format>(), Ok(Format::Json));
        assert_eq!("THINGSBOARD_JSON".parse::<Format>(), Ok(Format::ThingsBoardJson));

        for unsupported in ["CSV", "SERIALIZED", "json", ""] {
            assert_eq!(
                unsupported.parse::<Format>(),
                Err(CompileError::unsupported("format", unsupported))
            );
        }
    }

    #[test]
    fn json_formatter_round_trips_the_event() {
        let event = sample_event();
        let bytes = Format::Json.formatter().format(&event);

        let decoded: Event = serde_json::from_slice(&bytes).expect("json body should decode");
        assert_eq!(decoded, event);
        assert_eq!(Format::IotCoreJson.formatter().format(&event), bytes);
    }

    #[test]
    fn xml_formatter_emits_event_root_with_readings() {
        let event = sample_event().with_tag("site", "hall");
        let body = String::from_utf8(Format::Xml.formatter().format(&event))
            .expect("xml body should be utf-8");

        assert!(body.starts_with("<Event>"), "{body}");
        assert!(body.contains("<device>devA</device>"), "{body}");
        assert!(body.contains("<name>temperature</name>"), "{body}");
        assert!(body.contains("<value>hall</value>"), "{body}");
        assert!(body.ends_with("</Event>"), "{body}");
    }

    #[test]
    fn thingsboard_formatter_groups_values_under_device() {
        let body: Value =
            serde_json::from_slice(&Format::ThingsBoardJson.formatter().format(&sample_event()))
                .expect("thingsboard body should decode");

        assert_eq!(body["devA"][0]["ts"], 1000);
        assert_eq!(body["devA"][0]["values"]["temperature"], "21.5");
    }

    #[test]
    fn aws_formatter_coerces_numbers_and_booleans() {
        let body: Value =
            serde_json::from_slice(&Format::AwsJson.formatter().format(&sample_event()))
                .expect("shadow body should decode");

        let reported = &body["state"]["reported"];
        assert_eq!(reported["temperature"], 21.5);
        assert_eq!(reported["door_open"], true);
        assert_eq!(reported["label"], "kitchen");
    }

    #[test]
    fn azure_formatter_wraps_the_json_event() {
        let event = sample_event();
        let formatter = Format::AzureJson.formatter();
        let first: Value = serde_json::from_slice(&formatter.format(&event))
            .expect("azure message should decode");
        let second: Value = serde_json::from_slice(&formatter.format(&event))
            .expect("azure message should decode");

        assert_eq!(first["connectionDeviceId"], "devA");
        assert_eq!(first["userId"], "1000");
        assert!(first["properties"].as_object().is_some_and(|p| p.is_empty()));
        assert_ne!(first["id"], second["id"], "each message gets its own id");
        assert_ne!(first["id"], first["CorrelationId"]);

        let body = STANDARD
            .decode(first["body"].as_str().expect("body is a string"))
            .expect("body should be base64");
        let decoded: Event = serde_json::from_slice(&body).expect("body should be the event");
        assert_eq!(decoded, event);
    }

    #[test]
    fn noop_formatter_is_empty() {
        assert!(Format::Noop.formatter().format(&sample_event()).is_empty());
        assert_eq!(Format::Noop.content_type(), "application/octet-stream");
    }
}
