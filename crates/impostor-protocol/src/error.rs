//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum, so a
//! `ProtocolError` always means "the bytes or the message shape were
//! wrong", never a networking or game-rule problem.

/// Errors that can occur while encoding, decoding, or validating a
/// message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value).
    ///
    /// Malformed JSON, a missing field, or an unknown `type` tag all
    /// end up here.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, such as an
    /// intent arriving before the `Hello` handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
