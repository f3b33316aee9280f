//! Tunelink Hardware Abstraction Layer
//!
//! This crate defines the transport contract the protocol engine runs on:
//! a byte sink, a byte source with a non-blocking readiness poll, and a
//! monotonic millisecond clock. Board support code implements these traits
//! (or wraps an `embedded-io` port with [`io::IoUart`]).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tunelink-drivers (device commands)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tunelink-protocol (encode / decode)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tunelink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial byte transport
//! - [`clock::Clock`] - Monotonic millisecond time source

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

pub mod clock;
pub mod uart;

#[cfg(feature = "io")]
pub mod io;

#[cfg(feature = "mock")]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use uart::{ErrorType, Uart, UartRx, UartTx};

#[cfg(feature = "std")]
pub use clock::SystemClock;
