// BgpSim: BGP Network Simulator written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module for configuring and running traffic.
//!
//! A [`TrafficItem`] is described offline and created on the appliance when the lab is
//! connected. Raw traffic items additionally allow editing the packet header stack: appending
//! protocol templates (VLAN, IPv4, UDP, ...) after an existing stack member and setting the
//! value distribution of individual header fields.

use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    rest::{href_of, RestError},
    session::UhdSession,
};

/// The type of a traffic item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficType {
    /// Routed IPv4 traffic between topology endpoints.
    Ipv4,
    /// Raw ethernet frames between port endpoints, with a hand-built header stack.
    Raw,
}

impl TrafficType {
    fn as_str(&self) -> &'static str {
        match self {
            TrafficType::Ipv4 => "ipv4",
            TrafficType::Raw => "raw",
        }
    }
}

/// One side of an endpoint set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointRef {
    /// All devices of a topology, referenced by topology name.
    Topology(String),
    /// The protocols object of a vport, referenced by vport name (used for raw traffic).
    PortProtocols(String),
}

/// A flow group: traffic from all `sources` to all `destinations`.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    pub sources: Vec<EndpointRef>,
    pub destinations: Vec<EndpointRef>,
}

impl EndpointSet {
    /// Create an endpoint set with a single source and destination.
    pub fn new(source: EndpointRef, destination: EndpointRef) -> Self {
        Self {
            sources: vec![source],
            destinations: vec![destination],
        }
    }
}

/// The rate at which frames are transmitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRate {
    /// Percentage of the line rate.
    PercentLineRate(f64),
    /// Absolute frames per second.
    FramesPerSecond(u64),
}

/// How long the item transmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionControl {
    /// Transmit until explicitly stopped.
    Continuous,
    /// Transmit exactly this many frames, then stop.
    FixedFrameCount(u64),
}

/// An offline description of a traffic item.
#[derive(Debug, Clone)]
pub struct TrafficItem {
    /// Name of the traffic item.
    pub name: String,
    /// The traffic type.
    pub traffic_type: TrafficType,
    /// Whether flows are generated in both directions.
    pub bidirectional: bool,
    /// The flow groups of this item.
    pub endpoint_sets: Vec<EndpointSet>,
    /// Frame rate of every flow group.
    pub frame_rate: FrameRate,
    /// Fixed frame size in bytes.
    pub frame_size: u32,
    /// Transmission duration control.
    pub transmission: TransmissionControl,
    /// Tracking fields for the flow statistics view.
    pub tracking: Vec<String>,
}

impl TrafficItem {
    /// Create a new traffic item with 50% line rate, 128-byte frames and continuous
    /// transmission.
    pub fn new(name: impl Into<String>, traffic_type: TrafficType) -> Self {
        Self {
            name: name.into(),
            traffic_type,
            bidirectional: false,
            endpoint_sets: Vec::new(),
            frame_rate: FrameRate::PercentLineRate(50.0),
            frame_size: 128,
            transmission: TransmissionControl::Continuous,
            tracking: Vec::new(),
        }
    }

    /// Set whether flows are generated in both directions.
    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Add a flow group.
    pub fn endpoint_set(mut self, endpoint_set: EndpointSet) -> Self {
        self.endpoint_sets.push(endpoint_set);
        self
    }

    /// Set the frame rate.
    pub fn frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the fixed frame size in bytes.
    pub fn frame_size(mut self, frame_size: u32) -> Self {
        self.frame_size = frame_size;
        self
    }

    /// Set the transmission duration control.
    pub fn transmission(mut self, transmission: TransmissionControl) -> Self {
        self.transmission = transmission;
        self
    }

    /// Track flows by the given fields.
    pub fn tracking(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tracking = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A traffic item created on the appliance.
#[derive(Debug, Clone)]
pub struct TrafficItemHandle {
    /// The appliance href of the item.
    pub href: String,
    /// Name of the item.
    pub name: String,
}

/// An endpoint set with its endpoint references resolved to appliance hrefs.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedEndpointSet {
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
}

/// Create a traffic item on the appliance and configure its flow groups and config elements.
pub(crate) async fn create_traffic_item(
    session: &UhdSession,
    item: &TrafficItem,
    endpoint_sets: Vec<ResolvedEndpointSet>,
) -> Result<TrafficItemHandle, TrafficError> {
    log::debug!("[{}] Create traffic item {}", session.rest().name(), item.name);

    let created = session
        .rest()
        .post(
            session.href("traffic/trafficItem"),
            &json!({
                "name": item.name,
                "trafficType": item.traffic_type.as_str(),
                "biDirectional": item.bidirectional,
            }),
        )
        .await?;
    let href = created_href(&created)?;
    let handle = TrafficItemHandle {
        href,
        name: item.name.clone(),
    };

    for set in endpoint_sets {
        session
            .rest()
            .post(
                format!("{}/endpointSet", handle.href),
                &json!({
                    "sources": set.sources,
                    "destinations": set.destinations,
                }),
            )
            .await?;
    }

    // a traffic item can have one config element per endpoint set; configure them all alike.
    let elements: Vec<Value> = session
        .rest()
        .get(format!("{}/configElement", handle.href))
        .await?;
    if elements.is_empty() {
        return Err(TrafficError::NoConfigElement(item.name.clone()));
    }
    for element in &elements {
        let el_href =
            href_of(element).ok_or(RestError::UnexpectedPayload("configElement without href"))?;
        configure_element(session, &el_href, item).await?;
    }

    if !item.tracking.is_empty() {
        let trackings: Vec<Value> = session
            .rest()
            .get(format!("{}/tracking", handle.href))
            .await?;
        if let Some(tracking) = trackings.first() {
            let tr_href =
                href_of(tracking).ok_or(RestError::UnexpectedPayload("tracking without href"))?;
            session
                .rest()
                .patch(tr_href, &json!({ "trackBy": item.tracking }))
                .await?;
        }
    }

    Ok(handle)
}

/// Configure frame rate, frame size, rate distribution and transmission control of one config
/// element.
async fn configure_element(
    session: &UhdSession,
    element: &str,
    item: &TrafficItem,
) -> Result<(), TrafficError> {
    let rest = session.rest();

    let frame_rate = match item.frame_rate {
        FrameRate::PercentLineRate(rate) => json!({ "type": "percentLineRate", "rate": rate }),
        FrameRate::FramesPerSecond(fps) => json!({ "type": "framesPerSecond", "rate": fps }),
    };
    rest.patch(format!("{element}/frameRate"), &frame_rate).await?;

    rest.patch(
        format!("{element}/frameRateDistribution"),
        &json!({ "portDistribution": "splitRateEvenly" }),
    )
    .await?;

    rest.patch(
        format!("{element}/frameSize"),
        &json!({ "type": "fixed", "fixedSize": item.frame_size }),
    )
    .await?;

    let transmission = match item.transmission {
        TransmissionControl::Continuous => json!({ "type": "continuous" }),
        TransmissionControl::FixedFrameCount(count) => {
            json!({ "type": "fixedFrameCount", "frameCount": count })
        }
    };
    rest.patch(format!("{element}/transmissionControl"), &transmission)
        .await?;

    Ok(())
}

/// Find all traffic items of the current configuration.
pub async fn find_traffic_items(
    session: &UhdSession,
) -> Result<Vec<TrafficItemHandle>, TrafficError> {
    let items: Vec<Value> = session.rest().get(session.href("traffic/trafficItem")).await?;
    items
        .into_iter()
        .map(|obj| {
            Ok(TrafficItemHandle {
                href: href_of(&obj)
                    .ok_or(RestError::UnexpectedPayload("trafficItem without href"))?,
                name: obj
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

/// Generate the flows of a traffic item.
pub async fn generate(
    session: &UhdSession,
    item: &TrafficItemHandle,
) -> Result<(), TrafficError> {
    session
        .rest()
        .execute(
            format!("{}/operations/generate", item.href),
            &json!({ "arg1": [item.href] }),
        )
        .await?;
    Ok(())
}

/// Apply the generated traffic configuration to the hardware.
pub async fn apply(session: &UhdSession) -> Result<(), TrafficError> {
    let traffic = session.href("traffic");
    session
        .rest()
        .execute(
            session.href("traffic/operations/apply"),
            &json!({ "arg1": traffic }),
        )
        .await?;
    Ok(())
}

/// Start transmitting, returning once transmission is running.
pub async fn start_blocking(session: &UhdSession) -> Result<(), TrafficError> {
    log::debug!("[{}] Start traffic (blocking)", session.rest().name());
    session
        .rest()
        .execute(
            session.href("traffic/operations/startstatelesstrafficblocking"),
            &json!({}),
        )
        .await?;
    Ok(())
}

/// Stop transmitting, returning once transmission has stopped.
pub async fn stop_blocking(session: &UhdSession) -> Result<(), TrafficError> {
    log::debug!("[{}] Stop traffic (blocking)", session.rest().name());
    session
        .rest()
        .execute(
            session.href("traffic/operations/stopstatelesstrafficblocking"),
            &json!({}),
        )
        .await?;
    Ok(())
}

/// Start transmitting without waiting for the transmit state.
pub async fn start(session: &UhdSession) -> Result<(), TrafficError> {
    log::debug!("[{}] Start traffic", session.rest().name());
    session
        .rest()
        .execute(session.href("traffic/operations/start"), &json!({}))
        .await?;
    Ok(())
}

/// Stop transmitting without waiting.
pub async fn stop(session: &UhdSession) -> Result<(), TrafficError> {
    log::debug!("[{}] Stop traffic", session.rest().name());
    session
        .rest()
        .execute(session.href("traffic/operations/stop"), &json!({}))
        .await?;
    Ok(())
}

/// A packet header in the stack of a raw traffic item.
#[derive(Debug, Clone)]
pub struct StackHandle {
    /// The appliance href of the stack member.
    pub href: String,
    /// Display name of the header (e.g. `Ethernet II`, `IPv4`).
    pub display_name: String,
}

/// The value distribution of a single packet header field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A fixed value for every frame.
    Single(Value),
    /// Incrementing values.
    Increment {
        start: Value,
        step: Value,
        count: u64,
    },
    /// An explicit list of values, cycled through.
    List(Vec<Value>),
    /// Select one choice of an either-or field (e.g. the IPv4 precedence choices).
    Choice(String),
}

/// Find a packet header stack member of the first config element by display name prefix.
pub async fn find_stack(
    session: &UhdSession,
    item: &TrafficItemHandle,
    display_name: &str,
) -> Result<StackHandle, TrafficError> {
    let element = first_config_element(session, item).await?;
    let stacks: Vec<Value> = session.rest().get(format!("{element}/stack")).await?;
    for stack in &stacks {
        let name = match stack.get("displayName").and_then(Value::as_str) {
            Some(name) => name,
            None => continue,
        };
        if name.starts_with(display_name) {
            let href =
                href_of(stack).ok_or(RestError::UnexpectedPayload("stack without href"))?;
            return Ok(StackHandle {
                href,
                display_name: name.to_string(),
            });
        }
    }
    Err(TrafficError::StackNotFound(display_name.to_string()))
}

/// Append a protocol template (by display name prefix) after the given stack member of a raw
/// traffic item. Returns `None` (with a log message listing the supported templates) if the
/// appliance does not offer a matching template.
pub async fn append_header(
    session: &UhdSession,
    item: &TrafficItemHandle,
    header: &str,
    after: &str,
) -> Result<Option<StackHandle>, TrafficError> {
    let templates: Vec<Value> = session
        .rest()
        .get(session.href("traffic/protocolTemplate"))
        .await?;

    let template = templates.iter().find(|t| {
        t.get("displayName")
            .and_then(Value::as_str)
            .map(|n| n.starts_with(header))
            .unwrap_or(false)
    });
    let template = match template {
        Some(t) => t,
        None => {
            log::info!(
                "[{}] {} protocol template not supported, skipping. Supported protocol templates: {}",
                session.rest().name(),
                header,
                templates
                    .iter()
                    .filter_map(|t| t.get("displayName").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("|")
            );
            return Ok(None);
        }
    };
    let template_href =
        href_of(template).ok_or(RestError::UnexpectedPayload("protocolTemplate without href"))?;

    let after_stack = find_stack(session, item, after).await?;
    log::debug!(
        "[{}] Adding protocol template {} on top of stack {}",
        session.rest().name(),
        header,
        after_stack.display_name
    );
    session
        .rest()
        .execute(
            format!("{}/operations/appendprotocol", after_stack.href),
            &json!({ "arg1": after_stack.href, "arg2": template_href }),
        )
        .await?;

    find_stack(session, item, header).await.map(Some)
}

/// Set the value distribution of a packet header field, found by display name.
pub async fn set_field(
    session: &UhdSession,
    stack: &StackHandle,
    display_name: &str,
    value: FieldValue,
) -> Result<(), TrafficError> {
    let fields: Vec<Value> = session.rest().get(format!("{}/field", stack.href)).await?;
    let field = fields
        .iter()
        .find(|f| f.get("displayName").and_then(Value::as_str) == Some(display_name))
        .ok_or_else(|| TrafficError::FieldNotFound(display_name.to_string()))?;
    let field_href = href_of(field).ok_or(RestError::UnexpectedPayload("field without href"))?;

    let body = match value {
        FieldValue::Single(v) => json!({
            "auto": false,
            "valueType": "singleValue",
            "singleValue": v,
        }),
        FieldValue::Increment { start, step, count } => json!({
            "auto": false,
            "valueType": "increment",
            "startValue": start,
            "stepValue": step,
            "countValue": count,
        }),
        FieldValue::List(values) => json!({
            "auto": false,
            "valueType": "valueList",
            "valueList": values,
        }),
        FieldValue::Choice(choice) => json!({
            "activeFieldChoice": true,
            "fieldValue": choice,
        }),
    };
    session.rest().patch(field_href, &body).await?;
    Ok(())
}

/// Get the href of the first config element of a traffic item.
async fn first_config_element(
    session: &UhdSession,
    item: &TrafficItemHandle,
) -> Result<String, TrafficError> {
    let elements: Vec<Value> = session
        .rest()
        .get(format!("{}/configElement", item.href))
        .await?;
    let first = elements
        .first()
        .ok_or_else(|| TrafficError::NoConfigElement(item.name.clone()))?;
    Ok(href_of(first).ok_or(RestError::UnexpectedPayload("configElement without href"))?)
}

/// Extract the href of a newly created object from the creation response.
fn created_href(created: &Value) -> Result<String, TrafficError> {
    // the appliance either returns the object itself, or a list containing it.
    let obj = match created {
        Value::Array(xs) => xs.first().unwrap_or(&Value::Null),
        x => x,
    };
    Ok(href_of(obj).ok_or(RestError::UnexpectedPayload("created object without href"))?)
}

/// Error kind returned when configuring traffic.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// Error on the REST transport.
    #[error("{0}")]
    Rest(#[from] RestError),
    /// The traffic item has no config element (no endpoint set was added).
    #[error("Traffic item {0} has no config element")]
    NoConfigElement(String),
    /// No stack member with the given display name exists.
    #[error("No packet header stack named {0}")]
    StackNotFound(String),
    /// No field with the given display name exists in the stack member.
    #[error("No packet header field named {0}")]
    FieldNotFound(String),
    /// An endpoint reference cannot be resolved.
    #[error("Cannot resolve traffic endpoint: {0}")]
    UnknownEndpoint(String),
}
