//! Discovery data model

use crate::signature::TypeSignature;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Directions, roles and slots
// ============================================================================

/// Which way messages flow through a channel, seen from the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelDirection {
    /// The application consumes from the channel
    Incoming,
    /// The application produces to the channel
    Outgoing,
}

impl ChannelDirection {
    /// Segment used in `mp.messaging.<direction>.*` keys
    pub fn config_segment(&self) -> &'static str {
        match self {
            ChannelDirection::Incoming => "incoming",
            ChannelDirection::Outgoing => "outgoing",
        }
    }

    /// Serde role required to move payloads in this direction
    pub fn role(&self) -> SerdeRole {
        match self {
            ChannelDirection::Incoming => SerdeRole::Deserializer,
            ChannelDirection::Outgoing => SerdeRole::Serializer,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            ChannelDirection::Incoming => ChannelDirection::Outgoing,
            ChannelDirection::Outgoing => ChannelDirection::Incoming,
        }
    }
}

impl fmt::Display for ChannelDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_segment())
    }
}

impl std::str::FromStr for ChannelDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INCOMING" | "IN" => Ok(ChannelDirection::Incoming),
            "OUTGOING" | "OUT" => Ok(ChannelDirection::Outgoing),
            _ => Err(format!("Invalid channel direction: {}", s)),
        }
    }
}

/// Serializer or deserializer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerdeRole {
    Serializer,
    Deserializer,
}

impl SerdeRole {
    pub fn config_segment(&self) -> &'static str {
        match self {
            SerdeRole::Serializer => "serializer",
            SerdeRole::Deserializer => "deserializer",
        }
    }
}

impl fmt::Display for SerdeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_segment())
    }
}

/// Key or value position of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Key,
    Value,
}

impl Slot {
    pub fn config_segment(&self) -> &'static str {
        match self {
            Slot::Key => "key",
            Slot::Value => "value",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_segment())
    }
}

// ============================================================================
// Injection points
// ============================================================================

/// How an injection point was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// `@Incoming` / `@Outgoing` on a method
    Annotation,
    /// `@Channel` on a field or parameter
    Channel,
}

/// Declaration an injection point comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InjectionSite {
    Method {
        class: String,
        method: String,
    },
    Field {
        class: String,
        field: String,
    },
    Parameter {
        class: String,
        method: String,
        position: usize,
    },
}


impl fmt::Display for InjectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionSite::Method { class, method } => write!(f, "{}#{}", class, method),
            InjectionSite::Field { class, field } => write!(f, "{}#{}", class, field),
            InjectionSite::Parameter {
                class,
                method,
                position,
            } => write!(f, "{}#{}[{}]", class, method, position),
        }
    }
}

impl Serialize for InjectionSite {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One messaging integration point found in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    pub channel: String,
    pub direction: ChannelDirection,
    /// Declared type carrying the payload for this direction, if any.
    /// Points without one still take part in channel wiring.
    pub signature: Option<TypeSignature>,
    pub provenance: Provenance,
    pub site: InjectionSite,
}

// ============================================================================
// Outputs
// ============================================================================

/// A serde class chosen for one channel slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SerdeAssignment {
    pub channel: String,
    pub direction: ChannelDirection,
    pub slot: Slot,
    pub serde_class: String,
}

impl SerdeAssignment {
    /// `mp.messaging.<direction>.<channel>.<slot>.<role>`
    pub fn config_key(&self) -> String {
        channel_serde_key(self.direction, &self.channel, self.slot)
    }
}

/// Channel-scoped serde key
pub fn channel_serde_key(direction: ChannelDirection, channel: &str, slot: Slot) -> String {
    format!(
        "mp.messaging.{}.{}.{}.{}",
        direction.config_segment(),
        channel,
        slot.config_segment(),
        direction.role().config_segment()
    )
}

/// Connector-scoped serde key
pub fn connector_serde_key(connector: &str, direction: ChannelDirection, slot: Slot) -> String {
    format!(
        "mp.messaging.connector.{}.{}.{}",
        connector,
        slot.config_segment(),
        direction.role().config_segment()
    )
}

/// A generated configuration default
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConfigDefault {
    pub key: String,
    pub value: String,
}

impl ConfigDefault {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ConfigDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// A payload class that needs reflective access
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PayloadRegistration {
    pub site: InjectionSite,
    pub channel: String,
    pub payload: String,
}
