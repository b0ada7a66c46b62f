//! Payload types for message types with a fixed, known shape.
//!
//! `AUTH`, `COMMAND`, `RESPONSE`, `ERROR`, and `HEARTBEAT` payloads are
//! opaque application bytes and have no type here — only `HANDSHAKE`'s
//! payload has protocol-defined structure.

mod handshake;

pub use handshake::HandshakePayload;
