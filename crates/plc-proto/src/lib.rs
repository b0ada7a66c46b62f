//! Binary framing for the protocol runtime: a 16-byte little-endian header
//! plus payload, typed message kinds, an advisory flags bitfield, and the
//! fixed handshake payload.
//!
//! This crate is pure codec: it knows nothing about connection lifecycle or
//! sequencing policy (that's `plc-core`) and nothing about transports
//! (that's `plc-client`).

mod error;
mod flags;
mod frame;
mod header;
pub mod payloads;
mod opcode;

pub use error::FrameError;
pub use flags::Flags;
pub use frame::Frame;
pub use header::MessageHeader;
pub use opcode::MessageType;
