//! Device driver implementations
//!
//! This crate provides drivers built on the tunelink protocol engine:
//!
//! - Audio playback modules (DFR0534)

#![no_std]
#![deny(unsafe_code)]

pub mod audio;
pub mod config;

pub use config::PlayerConfig;
