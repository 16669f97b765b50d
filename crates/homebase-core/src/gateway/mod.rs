//! Whole-collection read/write façade over the remote store.
//!
//! The remote holds one JSON document per user per collection. Pulls and
//! pushes always move the entire collection; there is no per-record API.

mod memory;
mod supabase;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::Collection;

pub use memory::MemoryGateway;
pub use supabase::SupabaseGateway;

/// Coarse classification used by the scheduler to decide what to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network or availability problem; surfaced, retried by the next cycle.
    Transient,
    /// The remote rejected a field it does not know yet; swallowed.
    SchemaDrift,
    /// Anything else; surfaced.
    Fatal,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Remote store does not recognize a field: {0}")]
    UnknownField(String),
    #[error("Remote store error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Failed to parse remote payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Http(error) if error.is_builder() || error.is_decode() => ErrorClass::Fatal,
            Self::Http(_) | Self::Unavailable(_) => ErrorClass::Transient,
            Self::UnknownField(_) => ErrorClass::SchemaDrift,
            Self::InvalidConfiguration(_) | Self::Api { .. } | Self::Json(_) => ErrorClass::Fatal,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote store operations. Implementations must be safe to share across tasks.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Read the stored document, or `None` when the user has no row yet.
    async fn pull(&self, user_id: &str, collection: Collection) -> GatewayResult<Option<Value>>;

    /// Upsert the whole document for this user and collection.
    async fn push(&self, user_id: &str, collection: Collection, payload: &Value)
        -> GatewayResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors_coarsely() {
        assert_eq!(
            GatewayError::Unavailable("503".to_string()).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            GatewayError::UnknownField("favicon".to_string()).class(),
            ErrorClass::SchemaDrift
        );
        assert_eq!(
            GatewayError::Api {
                status: 401,
                message: "JWT expired".to_string()
            }
            .class(),
            ErrorClass::Fatal
        );
    }
}
