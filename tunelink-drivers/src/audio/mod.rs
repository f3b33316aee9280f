//! Audio playback module drivers

pub mod dfr0534;

pub use dfr0534::{Dfr0534, Error};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Equalizer preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Equalizer {
    #[default]
    Normal = 0,
    Pop = 1,
    Rock = 2,
    Jazz = 3,
    Classic = 4,
}

/// What happens when a track finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum LoopMode {
    /// Loop over every file on the drive
    #[default]
    RepeatAll = 0,
    /// Loop the current file
    RepeatOne = 1,
    /// Play the current file once, then stop
    SingleStop = 2,
    /// Random order over the drive
    Random = 3,
    /// Loop over the current directory
    RepeatDirectory = 4,
    /// Random order within the current directory
    RandomInDirectory = 5,
    /// Play the current directory in order, then stop
    SequentialInDirectory = 6,
    /// Play the drive in order, then stop
    Sequential = 7,
}

/// Audio output routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Channel {
    /// Onboard amplifier
    #[default]
    Mp3 = 0,
    /// DAC output
    Dac = 1,
    /// Both
    Mp3Aux = 2,
}

/// Storage drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Drive {
    Usb = 0,
    Sd = 1,
    #[default]
    Flash = 2,
}

impl Drive {
    /// Parse a drive from its wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Drive::Usb),
            1 => Some(Drive::Sd),
            2 => Some(Drive::Flash),
            _ => None,
        }
    }
}

/// Set of drives reported online
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveSet(u8);

impl DriveSet {
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if `drive` is online
    pub fn contains(self, drive: Drive) -> bool {
        self.0 & (1 << drive as u8) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 & 0b111 == 0
    }
}

/// Transport state reported by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayStatus {
    Stopped,
    Playing,
    Paused,
}

impl PlayStatus {
    /// Parse a status from its wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PlayStatus::Stopped),
            1 => Some(PlayStatus::Playing),
            2 => Some(PlayStatus::Paused),
            _ => None,
        }
    }
}
