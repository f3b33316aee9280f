//! Opcode table for the audio module command set
//!
//! Commands with no response are fire-and-forget: the module gives no
//! acknowledgement. Queries answer with a frame carrying the same opcode.

use crate::decoder::LengthPolicy;

/// Operation identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    QueryStatus = 0x01,
    Play = 0x02,
    Pause = 0x03,
    Stop = 0x04,
    Previous = 0x05,
    Next = 0x06,
    PlayByNumber = 0x07,
    PlayByName = 0x08,
    QueryDrives = 0x09,
    QueryCurrentDrive = 0x0A,
    SwitchDrive = 0x0B,
    QueryTotalFiles = 0x0C,
    QueryFileNumber = 0x0D,
    PlayLastInDirectory = 0x0E,
    NextDirectory = 0x0F,
    StopInserted = 0x10,
    QueryFirstInDirectory = 0x11,
    QueryFilesInDirectory = 0x12,
    SetVolume = 0x13,
    VolumeUp = 0x14,
    VolumeDown = 0x15,
    InsertByNumber = 0x16,
    SetDirectory = 0x17,
    SetLoopMode = 0x18,
    SetRepeatCount = 0x19,
    SetEqualizer = 0x1A,
    PlayCombined = 0x1B,
    StopCombined = 0x1C,
    SetChannel = 0x1D,
    QueryFileName = 0x1E,
    PrepareByNumber = 0x1F,
    RepeatSection = 0x20,
    StopRepeatSection = 0x21,
    Rewind = 0x22,
    FastForward = 0x23,
    QueryDuration = 0x24,
    /// Starts once-a-second runtime reports; the reports carry this opcode too
    RuntimeReports = 0x25,
    StopRuntimeReports = 0x26,
}

impl Opcode {
    /// Wire value
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse an opcode from its wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        use Opcode::*;
        Some(match byte {
            0x01 => QueryStatus,
            0x02 => Play,
            0x03 => Pause,
            0x04 => Stop,
            0x05 => Previous,
            0x06 => Next,
            0x07 => PlayByNumber,
            0x08 => PlayByName,
            0x09 => QueryDrives,
            0x0A => QueryCurrentDrive,
            0x0B => SwitchDrive,
            0x0C => QueryTotalFiles,
            0x0D => QueryFileNumber,
            0x0E => PlayLastInDirectory,
            0x0F => NextDirectory,
            0x10 => StopInserted,
            0x11 => QueryFirstInDirectory,
            0x12 => QueryFilesInDirectory,
            0x13 => SetVolume,
            0x14 => VolumeUp,
            0x15 => VolumeDown,
            0x16 => InsertByNumber,
            0x17 => SetDirectory,
            0x18 => SetLoopMode,
            0x19 => SetRepeatCount,
            0x1A => SetEqualizer,
            0x1B => PlayCombined,
            0x1C => StopCombined,
            0x1D => SetChannel,
            0x1E => QueryFileName,
            0x1F => PrepareByNumber,
            0x20 => RepeatSection,
            0x21 => StopRepeatSection,
            0x22 => Rewind,
            0x23 => FastForward,
            0x24 => QueryDuration,
            0x25 => RuntimeReports,
            0x26 => StopRuntimeReports,
            _ => return None,
        })
    }

    /// Length policy of the response, or `None` for fire-and-forget commands
    pub fn response_length(self) -> Option<LengthPolicy> {
        use Opcode::*;
        match self {
            QueryStatus | QueryDrives | QueryCurrentDrive => Some(LengthPolicy::Fixed(1)),
            QueryTotalFiles | QueryFileNumber | QueryFirstInDirectory | QueryFilesInDirectory => {
                Some(LengthPolicy::Fixed(2))
            }
            QueryDuration | RuntimeReports => Some(LengthPolicy::Fixed(3)),
            QueryFileName => Some(LengthPolicy::Any),
            _ => None,
        }
    }

    /// Returns true if the module answers this opcode
    pub fn is_query(self) -> bool {
        self.response_length().is_some()
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        opcode.code()
    }
}
