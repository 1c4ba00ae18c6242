//! Codecs between wire representations and structured objects.
//!
//! - [`canonical`]: binary canonical payloads of feature-store objects.
//! - [`store_config`]: discriminated store-configuration JSON on projects.
pub mod canonical;
pub mod store_config;

pub use canonical::{CanonicalObject, decode_base64, encode_base64};
pub use store_config::{MsSqlServerOfflineStore, RedisOnlineStore, StoreConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("store configuration is missing the `type` discriminator")]
    MissingDiscriminator,
    #[error("unknown store configuration type `{0}`")]
    UnknownDiscriminator(String),
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
