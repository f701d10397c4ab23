//! WebSocket envelope types and the codec between them and text frames.
//!
//! Inbound frames are parsed into [`InboundEnvelope`] by [`decode`], which
//! never panics and reports every rejection as a [`DecodeError`]. Outbound
//! envelopes are rendered by [`encode`].

use std::fmt;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::ErrorBody;
use crate::stream::{Batch, Offset};

/// Client-chosen subscription identifier, unique within a connection while
/// the subscription is live.
///
/// Any non-negative integral JSON number is accepted, including float
/// spellings such as `1.0` or `1e3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = Number::deserialize(deserializer)?;
        integral_u64(&n).map(Self).ok_or_else(|| {
            de::Error::custom(format!("expected a non-negative integer id, got {n}"))
        })
    }
}

impl SubscriptionId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SubscriptionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a `hello` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    /// Session the client wants this connection bound to.
    pub session_id: String,
}

/// Payload of a `subscribe` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribe {
    /// Id the client will see on every envelope for this subscription.
    pub subscription_id: SubscriptionId,
    /// Catalog name of the requested stream.
    pub name: String,
    /// Position to start the stream from.
    #[serde(deserialize_with = "integral_offset")]
    pub offset: Offset,
}

/// Payload of an `unsubscribe` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unsubscribe {
    /// Subscription to cancel.
    pub subscription_id: SubscriptionId,
}

/// Validated client → server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEnvelope {
    /// Binds the connection to a session.
    Hello(Hello),
    /// Opens a stream subscription.
    Subscribe(Subscribe),
    /// Cancels a stream subscription.
    Unsubscribe(Unsubscribe),
    /// Well-formed message with a `type` this server does not handle.
    Unknown {
        /// The unrecognised `type` value.
        msg_type: String,
    },
}

impl InboundEnvelope {
    /// Returns the wire `type` of this message.
    #[must_use]
    pub fn msg_type(&self) -> &str {
        match self {
            Self::Hello(_) => "hello",
            Self::Subscribe(_) => "subscribe",
            Self::Unsubscribe(_) => "unsubscribe",
            Self::Unknown { msg_type } => msg_type,
        }
    }
}

/// Server → client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundEnvelope {
    /// One batch of stream items.
    Events {
        /// Subscription the batch belongs to.
        subscription_id: SubscriptionId,
        /// Non-empty, ordered items.
        batch: Batch,
    },
    /// The subscription failed or could not be opened.
    Error {
        /// Subscription the error belongs to.
        subscription_id: SubscriptionId,
        /// Error code and message.
        error: ErrorBody,
    },
    /// The stream finished; no further envelopes follow for this id.
    Complete {
        /// Subscription that completed.
        subscription_id: SubscriptionId,
    },
}

impl OutboundEnvelope {
    /// Subscription this envelope is scoped to.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        match self {
            Self::Events {
                subscription_id, ..
            }
            | Self::Error {
                subscription_id, ..
            }
            | Self::Complete { subscription_id } => *subscription_id,
        }
    }
}

/// Why an inbound frame was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is not valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The frame has no string `type` field.
    #[error("message has no string `type` field")]
    MissingType,

    /// The payload does not match the schema for its `type`.
    #[error("invalid `{msg_type}` payload: {source}")]
    InvalidPayload {
        /// The message `type`.
        msg_type: String,
        /// Underlying schema error.
        #[source]
        source: serde_json::Error,
    },
}

/// Parses one inbound text frame.
///
/// # Errors
///
/// Returns a [`DecodeError`] for malformed JSON, a missing or non-string
/// `type`, or a payload that fails validation for its `type`. Unrecognised
/// types are not an error; they decode to [`InboundEnvelope::Unknown`].
pub fn decode(text: &str) -> Result<InboundEnvelope, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
    let msg_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;

    match msg_type {
        "hello" => payload(msg_type, &value).map(InboundEnvelope::Hello),
        "subscribe" => payload(msg_type, &value).map(InboundEnvelope::Subscribe),
        "unsubscribe" => payload(msg_type, &value).map(InboundEnvelope::Unsubscribe),
        other => Ok(InboundEnvelope::Unknown {
            msg_type: other.to_string(),
        }),
    }
}

/// Largest integer a JSON client using doubles can represent exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn integral_f64(n: &Number) -> Option<f64> {
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral_u64(n: &Number) -> Option<u64> {
    n.as_u64()
        .or_else(|| integral_f64(n).filter(|f| *f >= 0.0).map(|f| f as u64))
}

#[allow(clippy::cast_possible_truncation)]
fn integral_offset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Offset, D::Error> {
    let n = Number::deserialize(deserializer)?;
    n.as_i64()
        .or_else(|| integral_f64(&n).map(|f| f as i64))
        .ok_or_else(|| de::Error::custom(format!("expected an integer offset, got {n}")))
}

fn payload<T: DeserializeOwned>(msg_type: &str, value: &Value) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(|source| DecodeError::InvalidPayload {
        msg_type: msg_type.to_string(),
        source,
    })
}

/// Renders an outbound envelope as a text frame.
///
/// # Errors
///
/// Returns the serializer error if a batch item cannot be rendered.
pub fn encode(envelope: &OutboundEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}
