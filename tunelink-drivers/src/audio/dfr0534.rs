//! DFR0534 audio module (UART mode)
//!
//! The DFR0534 plays WAV and MP3 files from onboard flash, SD or USB. It is
//! controlled over a 9600 baud 8N1 serial link using tunelink frames:
//! - Start byte: 0xAA
//! - Opcode
//! - Payload length
//! - Payload (big-endian for 16-bit values)
//! - 8-bit wrapping sum of all preceding bytes
//!
//! Most commands are fire-and-forget; the module never acknowledges them.
//! Queries answer with a frame carrying the same opcode.
//!
//! # File selection
//!
//! Files can be picked by number (the order they were copied onto the drive,
//! starting at 1) or by path. Paths use the module's 8+3 convention without
//! the dot, e.g. `"/01      WAV"` for `01.wav`, and accept `*`/`?` wildcards.
//! This driver passes path bytes through unchanged.

use heapless::Vec;

use tunelink_hal::{Clock, UartRx, UartTx};
use tunelink_protocol::{DecodeError, FileName, Link, Opcode, Response, Timestamp, MAX_PAYLOAD_SIZE};

use super::{Channel, Drive, DriveSet, Equalizer, LoopMode, PlayStatus};
use crate::config::PlayerConfig;

/// DFR0534 communication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Query failed (timeout, checksum, malformed reply or receive error)
    Decode(DecodeError<E>),
    /// Transmit failed
    Uart(E),
    /// Argument outside the range the module accepts
    InvalidArgument,
    /// Request payload does not fit in a frame
    PayloadTooLarge,
}

impl<E> From<DecodeError<E>> for Error<E> {
    fn from(e: DecodeError<E>) -> Self {
        Error::Decode(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Decode(e) => write!(f, "{}", e),
            Error::Uart(e) => write!(f, "uart write failed: {:?}", e),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::PayloadTooLarge => f.write_str("payload too large"),
        }
    }
}

/// DFR0534 driver
///
/// Owns the serial port for the lifetime of the session. Every method is a
/// single exchange; nothing is retried.
pub struct Dfr0534<U, C> {
    link: Link<U, C>,
    config: PlayerConfig,
}

impl<U, C> Dfr0534<U, C>
where
    U: UartTx + UartRx,
    C: Clock,
{
    /// Create a driver over a configured 9600 baud port
    pub fn new(uart: U, clock: C, config: PlayerConfig) -> Self {
        Self {
            link: Link::new(uart, clock, config.timeouts),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: PlayerConfig) {
        self.link.set_timeouts(config.timeouts);
        self.config = config;
    }

    /// Borrow the serial port
    pub fn uart(&self) -> &U {
        self.link.uart()
    }

    /// End the session and hand back the port and clock
    pub fn release(self) -> (U, C) {
        self.link.release()
    }

    fn command(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), Error<U::Error>> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("dfr0534: {} ({=usize} bytes)", opcode, payload.len());

        self.link.send(opcode.code(), payload).map_err(Error::Uart)
    }

    /// Send a query and decode the answer with the opcode's length policy
    fn query<T: Response>(&mut self, opcode: Opcode) -> Result<T, Error<U::Error>> {
        let length = opcode.response_length().ok_or(Error::InvalidArgument)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("dfr0534: {}?", opcode);

        Ok(self.link.query_with(opcode.code(), &[], length)?)
    }

    fn drive_and_path(
        &mut self,
        opcode: Opcode,
        drive: Drive,
        path: &str,
    ) -> Result<(), Error<U::Error>> {
        let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
        payload.push(drive as u8).map_err(|_| Error::PayloadTooLarge)?;
        payload.extend_from_slice(path.as_bytes()).map_err(|_| Error::PayloadTooLarge)?;
        self.command(opcode, &payload)
    }

    // --- Transport ---

    /// Play the current file
    pub fn play(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::Play, &[])
    }

    /// Pause the current file
    pub fn pause(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::Pause, &[])
    }

    /// Stop the current file
    pub fn stop(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::Stop, &[])
    }

    /// Play the previous file (copy order)
    pub fn previous(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::Previous, &[])
    }

    /// Play the next file (copy order)
    pub fn next(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::Next, &[])
    }

    /// Seek backwards by `seconds`
    pub fn rewind(&mut self, seconds: u16) -> Result<(), Error<U::Error>> {
        self.command(Opcode::Rewind, &seconds.to_be_bytes())
    }

    /// Seek forwards by `seconds`
    pub fn fast_forward(&mut self, seconds: u16) -> Result<(), Error<U::Error>> {
        self.command(Opcode::FastForward, &seconds.to_be_bytes())
    }

    // --- File selection ---

    /// Play a file by number
    ///
    /// Numbers start at 1; 0 is rejected.
    pub fn play_file(&mut self, track: u16) -> Result<(), Error<U::Error>> {
        if track == 0 {
            return Err(Error::InvalidArgument);
        }
        self.command(Opcode::PlayByNumber, &track.to_be_bytes())
    }

    /// Select a file by number without starting playback
    pub fn prepare_file(&mut self, track: u16) -> Result<(), Error<U::Error>> {
        self.command(Opcode::PrepareByNumber, &track.to_be_bytes())
    }

    /// Play a file by 8+3 path, e.g. `"/10      /20      WAV"`
    pub fn play_path(&mut self, path: &str, drive: Drive) -> Result<(), Error<U::Error>> {
        self.drive_and_path(Opcode::PlayByName, drive, path)
    }

    /// Pause the current file, play another one, then resume
    pub fn insert_file(&mut self, track: u16, drive: Drive) -> Result<(), Error<U::Error>> {
        let [hi, lo] = track.to_be_bytes();
        self.command(Opcode::InsertByNumber, &[drive as u8, hi, lo])
    }

    /// Stop an inserted file and resume the interrupted one
    pub fn stop_inserted(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::StopInserted, &[])
    }

    /// Change directory by 8+3 path
    ///
    /// Accepted by the module but has no observable effect on current firmware.
    pub fn set_directory(&mut self, path: &str, drive: Drive) -> Result<(), Error<U::Error>> {
        self.drive_and_path(Opcode::SetDirectory, drive, path)
    }

    /// Play the last file in the current directory
    pub fn play_last_in_directory(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::PlayLastInDirectory, &[])
    }

    /// Play the first file of the next directory
    pub fn next_directory(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::NextDirectory, &[])
    }

    /// Switch the active drive
    pub fn switch_drive(&mut self, drive: Drive) -> Result<(), Error<U::Error>> {
        self.command(Opcode::SwitchDrive, &[drive as u8])
    }

    /// Play files from `/ZH` back to back, e.g. `"0103"` for `01` then `03`
    ///
    /// Every name is two characters. Loop mode is ignored; playback stops
    /// after the last file.
    pub fn play_combined(&mut self, list: &str) -> Result<(), Error<U::Error>> {
        if list.is_empty() || list.len() % 2 != 0 {
            return Err(Error::InvalidArgument);
        }
        self.command(Opcode::PlayCombined, list.as_bytes())
    }

    /// Stop combined playback
    pub fn stop_combined(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::StopCombined, &[])
    }

    /// Loop a section of the current file
    pub fn repeat_section(
        &mut self,
        start_minute: u8,
        start_second: u8,
        stop_minute: u8,
        stop_second: u8,
    ) -> Result<(), Error<U::Error>> {
        self.command(
            Opcode::RepeatSection,
            &[start_minute, start_second, stop_minute, stop_second],
        )
    }

    /// Stop looping a section
    pub fn stop_repeat_section(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::StopRepeatSection, &[])
    }

    // --- Output settings ---

    /// Set volume, clamped to the configured maximum
    pub fn set_volume(&mut self, volume: u8) -> Result<(), Error<U::Error>> {
        let volume = self.config.clamp_volume(volume);
        self.command(Opcode::SetVolume, &[volume])
    }

    /// Raise volume by one step
    pub fn volume_up(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::VolumeUp, &[])
    }

    /// Lower volume by one step
    pub fn volume_down(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::VolumeDown, &[])
    }

    pub fn set_equalizer(&mut self, equalizer: Equalizer) -> Result<(), Error<U::Error>> {
        self.command(Opcode::SetEqualizer, &[equalizer as u8])
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) -> Result<(), Error<U::Error>> {
        self.command(Opcode::SetLoopMode, &[mode as u8])
    }

    /// Number of repetitions for the looping modes
    pub fn set_repeat_count(&mut self, loops: u16) -> Result<(), Error<U::Error>> {
        self.command(Opcode::SetRepeatCount, &loops.to_be_bytes())
    }

    pub fn set_channel(&mut self, channel: Channel) -> Result<(), Error<U::Error>> {
        self.command(Opcode::SetChannel, &[channel as u8])
    }

    // --- Queries ---

    /// Current transport state
    pub fn status(&mut self) -> Result<PlayStatus, Error<U::Error>> {
        let byte: u8 = self.query(Opcode::QueryStatus)?;
        PlayStatus::from_byte(byte).ok_or(Error::Decode(DecodeError::Malformed))
    }

    /// Drives currently online
    pub fn drives(&mut self) -> Result<DriveSet, Error<U::Error>> {
        let bits: u8 = self.query(Opcode::QueryDrives)?;
        Ok(DriveSet::from_bits(bits))
    }

    /// Active drive
    pub fn current_drive(&mut self) -> Result<Drive, Error<U::Error>> {
        let byte: u8 = self.query(Opcode::QueryCurrentDrive)?;
        Drive::from_byte(byte).ok_or(Error::Decode(DecodeError::Malformed))
    }

    /// Number of playable files on the active drive
    pub fn total_files(&mut self) -> Result<u16, Error<U::Error>> {
        self.query(Opcode::QueryTotalFiles)
    }

    /// Number of the current file
    pub fn file_number(&mut self) -> Result<u16, Error<U::Error>> {
        self.query(Opcode::QueryFileNumber)
    }

    /// Number of the first file in the current directory
    pub fn first_file_in_directory(&mut self) -> Result<u16, Error<U::Error>> {
        self.query(Opcode::QueryFirstInDirectory)
    }

    /// Number of files in the current directory
    pub fn files_in_directory(&mut self) -> Result<u16, Error<U::Error>> {
        self.query(Opcode::QueryFilesInDirectory)
    }

    /// 8+3 name of the current file, e.g. `"TEST    WAV"`
    pub fn file_name(&mut self) -> Result<FileName, Error<U::Error>> {
        self.query(Opcode::QueryFileName)
    }

    /// Length of the current file
    pub fn duration(&mut self) -> Result<Timestamp, Error<U::Error>> {
        self.query(Opcode::QueryDuration)
    }

    // --- Runtime reports ---

    /// Ask the module to report elapsed time once a second
    pub fn start_runtime_reports(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::RuntimeReports, &[])
    }

    pub fn stop_runtime_reports(&mut self) -> Result<(), Error<U::Error>> {
        self.command(Opcode::StopRuntimeReports, &[])
    }

    /// Wait for the next runtime report
    ///
    /// Reports must have been enabled with [`Self::start_runtime_reports`].
    /// Nothing is sent.
    pub fn runtime(&mut self) -> Result<Timestamp, Error<U::Error>> {
        let opcode = Opcode::RuntimeReports;
        let length = opcode.response_length().ok_or(Error::InvalidArgument)?;
        Ok(self.link.listen_with(opcode.code(), length)?)
    }
}
