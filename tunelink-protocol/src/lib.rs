//! Tunelink serial protocol
//!
//! Host-side engine for the command/response protocol spoken by serial
//! audio playback modules. The host sends a command frame; for queries the
//! module answers with a frame of the same shape, one byte at a time, with
//! nothing but the start byte to find frame boundaries.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌───────┬────────┬────────┬─────────────┬──────────┐
//! │ START │ OPCODE │ LENGTH │ PAYLOAD     │ CHECKSUM │
//! │ 0xAA  │ 1B     │ 1B     │ 0–255B      │ 1B       │
//! └───────┴────────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The checksum is the wrapping 8-bit sum of every byte before it.
//!
//! - [`frame`] builds and writes outgoing frames
//! - [`decoder`] reads one response under an idle and a total timeout
//! - [`response`] turns a validated payload into a typed value
//! - [`link`] ties the three together for a single exchange

#![no_std]
#![deny(unsafe_code)]

pub mod decoder;
pub mod frame;
pub mod link;
pub mod opcode;
pub mod response;

pub use decoder::{decode, DecodeError, DecodeRequest, LengthPolicy, Timeouts};
pub use frame::{
    write_frame, Checksum, Frame, FrameError, Payload, FRAME_START, MAX_PAYLOAD_SIZE,
};
pub use link::Link;
pub use opcode::Opcode;
pub use response::{FileName, Response, Timestamp};
