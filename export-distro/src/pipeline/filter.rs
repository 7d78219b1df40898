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

//! Event filters applied ahead of formatting.

use crate::event::Event;
use crate::registration::FilterCriteria;
use std::borrow::Cow;
use std::collections::HashSet;

/// Predicate/transform over one event.
///
/// Returns whether the event is accepted together with the event the next stage sees.
/// Filters never fail; the shared input is never modified, a narrowed copy is returned instead.
pub trait EventFilter: Send + Sync {
    fn apply<'a>(&self, event: Cow<'a, Event>) -> (bool, Cow<'a, Event>);
}

/// Accepts only events whose device is in the allow-set.
pub struct DeviceIdFilter {
    device_ids: HashSet<String>,
}

impl DeviceIdFilter {
    pub fn new<I: IntoIterator<Item = String>>(device_ids: I) -> Self {
        Self {
            device_ids: device_ids.into_iter().collect(),
        }
    }
}

impl EventFilter for DeviceIdFilter {
    fn apply<'a>(&self, event: Cow<'a, Event>) -> (bool, Cow<'a, Event>) {
        let accepted = self.device_ids.contains(&event.device);
        (accepted, event)
    }
}

/// Keeps readings whose value descriptor is in the allow-set. Rejects the event
/// once no reading is left.
pub struct ValueDescriptorFilter {
    value_descriptor_ids: HashSet<String>,
}

impl ValueDescriptorFilter {
    pub fn new<I: IntoIterator<Item = String>>(value_descriptor_ids: I) -> Self {
        Self {
            value_descriptor_ids: value_descriptor_ids.into_iter().collect(),
        }
    }
}

impl EventFilter for ValueDescriptorFilter {
    fn apply<'a>(&self, event: Cow<'a, Event>) -> (bool, Cow<'a, Event>) {
        let kept = event
            .readings
            .iter()
            .filter(|reading| self.value_descriptor_ids.contains(&reading.name))
            .count();

        if kept == event.readings.len() {
            return (kept > 0, event);
        }

        let mut narrowed = event.into_owned();
        narrowed
            .readings
            .retain(|reading| self.value_descriptor_ids.contains(&reading.name));
        (kept > 0, Cow::Owned(narrowed))
    }
}

/// Builds the filter chain: device-id first, then value descriptor.
/// Empty allow-lists produce no filter.
pub(crate) fn build_filters(criteria: &FilterCriteria) -> Vec<Box<dyn EventFilter>> {
    let mut filters: Vec<Box<dyn EventFilter>> = Vec::new();

    if !criteria.device_ids.is_empty() {
        filters.push(Box::new(DeviceIdFilter::new(criteria.device_ids.clone())));
    }
    if !criteria.value_descriptor_ids.is_empty() {
        filters.push(Box::new(ValueDescriptorFilter::new(
            criteria.value_descriptor_ids.clone(),
        )));
    }

    filters
}
