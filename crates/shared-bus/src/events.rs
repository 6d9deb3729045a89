//! # Domain Events
//!
//! The events that flow through the shared exchange, one payload type per
//! routing key. Payloads are UTF-8 JSON on the wire and must be
//! self-contained: every subscriber applies its effect from the payload
//! alone, without querying the producing service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{MediaId, PostId, PostRecord, UserId};
use thiserror::Error;

/// Routing key for post creation events.
pub const POST_CREATED_KEY: &str = "post.created";

/// Routing key for post deletion events.
pub const POST_DELETED_KEY: &str = "post.deleted";

/// Errors turning wire bytes back into a typed event.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No payload type is registered for this routing key.
    #[error("no event type bound to routing key `{routing_key}`")]
    UnknownRoutingKey { routing_key: String },

    /// The payload was not valid JSON for the routing key's type.
    #[error("malformed payload for `{routing_key}`: {source}")]
    MalformedPayload {
        routing_key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Payload of `post.created`.
///
/// Carries the full canonical record so the search service can index it
/// without a read back to the post service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreatedPayload {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Payload of `post.deleted`.
///
/// Carries the attached media identifiers so the media service can cascade
/// the delete from the payload alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeletedPayload {
    pub post_id: PostId,
    pub user_id: UserId,
    pub media_ids: Vec<MediaId>,
}

/// All domain events that can be published to the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A post was committed to the primary store.
    PostCreated(PostCreatedPayload),
    /// A post was deleted from the primary store.
    PostDeleted(PostDeletedPayload),
}

impl DomainEvent {
    /// Build a `post.created` event from a committed record.
    #[must_use]
    pub fn post_created(record: &PostRecord) -> Self {
        Self::PostCreated(PostCreatedPayload {
            post_id: record.id.clone(),
            user_id: record.user_id.clone(),
            content: record.content.clone(),
            created_at: record.created_at,
        })
    }

    /// Build a `post.deleted` event from the record removed from the store.
    #[must_use]
    pub fn post_deleted(record: &PostRecord) -> Self {
        Self::PostDeleted(PostDeletedPayload {
            post_id: record.id.clone(),
            user_id: record.user_id.clone(),
            media_ids: record.media_ids.clone(),
        })
    }

    /// The routing key this event is published under.
    #[must_use]
    pub fn routing_key(&self) -> &'static str {
        match self {
            Self::PostCreated(_) => POST_CREATED_KEY,
            Self::PostDeleted(_) => POST_DELETED_KEY,
        }
    }

    /// Serialize the payload to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures; payload types here cannot actually
    /// fail to serialize.
    pub fn payload_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::PostCreated(payload) => serde_json::to_vec(payload),
            Self::PostDeleted(payload) => serde_json::to_vec(payload),
        }
    }

    /// Decode a wire payload back into a typed event.
    ///
    /// # Errors
    ///
    /// `DecodeError::UnknownRoutingKey` for keys no payload type is bound
    /// to, `DecodeError::MalformedPayload` for JSON that does not match the
    /// key's schema.
    pub fn decode(routing_key: &str, body: &[u8]) -> Result<Self, DecodeError> {
        match routing_key {
            POST_CREATED_KEY => serde_json::from_slice(body)
                .map(Self::PostCreated)
                .map_err(|source| DecodeError::MalformedPayload {
                    routing_key: routing_key.to_owned(),
                    source,
                }),
            POST_DELETED_KEY => serde_json::from_slice(body)
                .map(Self::PostDeleted)
                .map_err(|source| DecodeError::MalformedPayload {
                    routing_key: routing_key.to_owned(),
                    source,
                }),
            _ => Err(DecodeError::UnknownRoutingKey {
                routing_key: routing_key.to_owned(),
            }),
        }
    }
}
