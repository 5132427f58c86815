use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use gemwire_frame::{decode_frame, encode_request, Command, Frame, FrameConfig, Payload, MIN_FRAME_SIZE};
use gemwire_record::{fix16_to_raw, gem_monitor_update, gem_settings, Record, RecordLayout};
use gemwire_transport::Transport;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::chunks::{chunk_count, reassemble_chunks, split_chunks};
use crate::error::{DeviceError, Result};
use crate::profile::{FirmwareProfile, SettingsTransfer, MAX_CHUNKS};

/// Length of the serial number in a `get_serial_number` response.
pub const SERIAL_NUMBER_LEN: usize = 16;

/// What to do with a response payload once the frame is stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Return the payload bytes as received.
    Raw,
    /// Teeth-decode the payload first.
    Decoded,
}

/// Serial number and hardware revision reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialNumber {
    /// Lowercase hex of the 16 serial bytes.
    pub serial: String,
    /// Present on boards that report it after the serial.
    pub hardware_revision: Option<u8>,
}

/// A device session that exclusively owns one transport.
///
/// Requests are strictly sequential: each call sends one frame and, where a
/// response is expected, reads exactly one message before returning. The
/// device's mode (normal, calibration, bootloader) is not tracked here.
pub struct Device<T> {
    transport: T,
    profile: FirmwareProfile,
    frame_config: FrameConfig,
    settings_layout: Arc<RecordLayout>,
    monitor_layout: Arc<RecordLayout>,
}

impl<T: Transport> Device<T> {
    /// Wrap a transport, using the built-in Gemini record layouts.
    pub fn new(transport: T, profile: FirmwareProfile) -> Self {
        let frame_config = FrameConfig {
            device_marker: profile.device_marker(),
            ..FrameConfig::default()
        };
        Self {
            transport,
            profile,
            frame_config,
            settings_layout: gem_settings(),
            monitor_layout: gem_monitor_update(),
        }
    }

    /// Override the settings record layout.
    pub fn with_settings_layout(mut self, layout: Arc<RecordLayout>) -> Self {
        self.settings_layout = layout;
        self
    }

    /// Override the monitor update layout.
    pub fn with_monitor_layout(mut self, layout: Arc<RecordLayout>) -> Self {
        self.monitor_layout = layout;
        self
    }

    /// Override the maximum outbound frame size.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.frame_config.max_message_size = max_message_size;
        self
    }

    pub fn profile(&self) -> &FirmwareProfile {
        &self.profile
    }

    pub fn frame_config(&self) -> &FrameConfig {
        &self.frame_config
    }

    pub fn settings_layout(&self) -> &Arc<RecordLayout> {
        &self.settings_layout
    }

    pub fn monitor_layout(&self) -> &Arc<RecordLayout> {
        &self.monitor_layout
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Wire code for `command` under the active profile.
    pub fn code(&self, command: Command) -> Result<u8> {
        self.profile
            .commands()
            .code(command)
            .ok_or_else(|| DeviceError::UnsupportedCommand {
                command,
                profile: self.profile.name().to_string(),
            })
    }

    /// Send one request frame. No response is read.
    pub fn send_command(&mut self, code: u8, payload: Payload<'_>) -> Result<()> {
        let mut buf = BytesMut::with_capacity(MIN_FRAME_SIZE + payload.wire_len());
        encode_request(&self.frame_config, code, payload, &mut buf)?;
        debug!(code, len = buf.len(), "sending frame");
        trace!(frame = ?&buf[..], "frame bytes");
        self.transport.send(&buf)?;
        Ok(())
    }

    /// Send one request frame, then read exactly one response.
    ///
    /// The response's delimiters and device marker are checked and stripped.
    /// Its command byte is not matched against the request.
    pub fn send_command_expect_response(
        &mut self,
        code: u8,
        payload: Payload<'_>,
        mode: ResponseMode,
    ) -> Result<Bytes> {
        self.send_command(code, payload)?;
        let frame = self.receive_frame()?;
        match mode {
            ResponseMode::Raw => Ok(frame.payload),
            ResponseMode::Decoded => Ok(Bytes::from(gemwire_teeth::decode(&frame.payload)?)),
        }
    }

    /// Read and parse the next inbound message.
    pub fn receive_frame(&mut self) -> Result<Frame> {
        let message = self.transport.receive()?;
        trace!(frame = ?&message[..], "received bytes");
        let frame = decode_frame(&message, self.frame_config.device_marker)?;
        debug!(
            code = frame.command,
            command = ?self.profile.commands().command_for(frame.command),
            len = frame.payload.len(),
            "received frame"
        );
        Ok(frame)
    }

    /// Fire-and-forget a symbolic command.
    pub fn command(&mut self, command: Command, payload: Payload<'_>) -> Result<()> {
        let code = self.code(command)?;
        self.send_command(code, payload)
    }

    /// Send a symbolic command and return its response payload.
    pub fn request(
        &mut self,
        command: Command,
        payload: Payload<'_>,
        mode: ResponseMode,
    ) -> Result<Bytes> {
        let code = self.code(command)?;
        self.send_command_expect_response(code, payload, mode)
    }

    /// Firmware build-info string.
    pub fn firmware_version(&mut self) -> Result<String> {
        let payload = self.request(Command::Hello, Payload::Empty, ResponseMode::Raw)?;
        if !payload.is_ascii() {
            return Err(DeviceError::InvalidResponse {
                command: Command::Hello,
                reason: "version string is not ASCII".to_string(),
            });
        }
        Ok(payload.iter().map(|&b| char::from(b)).collect())
    }

    /// Serial number and, where reported, hardware revision.
    pub fn serial_number(&mut self) -> Result<SerialNumber> {
        let payload = self.request(
            Command::GetSerialNumber,
            Payload::Empty,
            ResponseMode::Decoded,
        )?;
        if payload.len() < SERIAL_NUMBER_LEN {
            return Err(DeviceError::MalformedResponse {
                command: Command::GetSerialNumber,
                expected: SERIAL_NUMBER_LEN,
                actual: payload.len(),
            });
        }

        Ok(SerialNumber {
            serial: payload[..SERIAL_NUMBER_LEN]
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect(),
            hardware_revision: payload.get(SERIAL_NUMBER_LEN).copied(),
        })
    }

    /// Read the full settings record.
    pub fn read_settings(&mut self) -> Result<Record> {
        let packed = self.read_settings_packed()?;
        Ok(Record::unpack(Arc::clone(&self.settings_layout), &packed)?)
    }

    /// Read the settings record as packed bytes.
    pub fn read_settings_packed(&mut self) -> Result<Vec<u8>> {
        let packed_size = self.settings_layout.packed_size();

        let packed = match self.profile.settings_transfer() {
            SettingsTransfer::SingleShot => self
                .request(Command::ReadSettings, Payload::Empty, ResponseMode::Decoded)?
                .to_vec(),
            SettingsTransfer::Chunked { chunk_size } => self.read_settings_chunked(chunk_size)?,
            SettingsTransfer::ChunkedDecoded { chunk_size } => {
                self.read_settings_chunked_decoded(chunk_size)?
            }
        };

        if packed.len() != packed_size {
            return Err(DeviceError::MalformedResponse {
                command: Command::ReadSettings,
                expected: packed_size,
                actual: packed.len(),
            });
        }
        debug!(len = packed.len(), "read settings");
        Ok(packed)
    }

    fn read_settings_chunked(&mut self, chunk_size: usize) -> Result<Vec<u8>> {
        let code = self.code(Command::ReadSettings)?;
        let encoded_len = gemwire_teeth::encoded_length(self.settings_layout.packed_size());
        let count = self.checked_chunk_count(encoded_len, chunk_size)?;

        let mut chunks = Vec::with_capacity(count);
        for index in 0..count {
            let chunk =
                self.send_command_expect_response(code, Payload::Raw(&[index as u8]), ResponseMode::Raw)?;
            if chunk.len() != chunk_size {
                return Err(DeviceError::MalformedResponse {
                    command: Command::ReadSettings,
                    expected: chunk_size + MIN_FRAME_SIZE,
                    actual: chunk.len() + MIN_FRAME_SIZE,
                });
            }
            trace!(index, "settings chunk received");
            chunks.push(chunk);
        }

        let encoded = reassemble_chunks(chunks.iter().map(|chunk| &chunk[..]), encoded_len);
        Ok(gemwire_teeth::decode(&encoded)?)
    }

    /// Each chunk is decoded as it arrives. Only the last may be short, and
    /// then only by whole groups.
    fn read_settings_chunked_decoded(&mut self, chunk_size: usize) -> Result<Vec<u8>> {
        let code = self.code(Command::ReadSettings)?;
        let packed_size = self.settings_layout.packed_size();
        let count = self.checked_chunk_count(gemwire_teeth::encoded_length(packed_size), chunk_size)?;
        let piece = chunk_size / gemwire_teeth::GROUP_SIZE * gemwire_teeth::BYTES_PER_GROUP;

        let mut packed = Vec::with_capacity(packed_size);
        for index in 0..count {
            let remaining = packed_size - index * piece;
            let expected = gemwire_teeth::encoded_length(remaining.min(piece));

            let chunk =
                self.send_command_expect_response(code, Payload::Raw(&[index as u8]), ResponseMode::Raw)?;
            if chunk.len() != expected {
                return Err(DeviceError::MalformedResponse {
                    command: Command::ReadSettings,
                    expected: expected + MIN_FRAME_SIZE,
                    actual: chunk.len() + MIN_FRAME_SIZE,
                });
            }
            packed.extend(gemwire_teeth::decode(&chunk)?);
            trace!(index, "settings chunk decoded");
        }
        Ok(packed)
    }

    /// Write the full settings record, replacing what the device stores.
    ///
    /// If this fails partway through a chunked write the device may hold a
    /// mix of old and new data. Read back before trusting it.
    pub fn write_settings(&mut self, record: &Record) -> Result<()> {
        if record.layout() != self.settings_layout.as_ref() {
            return Err(DeviceError::LayoutMismatch {
                expected: self.settings_layout.name().to_string(),
                actual: record.layout().name().to_string(),
            });
        }
        self.write_settings_packed(&record.pack())
    }

    /// Write an already packed settings record.
    pub fn write_settings_packed(&mut self, packed: &[u8]) -> Result<()> {
        let packed_size = self.settings_layout.packed_size();
        if packed.len() != packed_size {
            return Err(DeviceError::InvalidArgument(format!(
                "settings record must be {packed_size} bytes, got {}",
                packed.len()
            )));
        }

        match self.profile.settings_transfer() {
            SettingsTransfer::SingleShot => {
                self.request(Command::WriteSettings, Payload::Teeth(packed), ResponseMode::Raw)?;
            }
            SettingsTransfer::Chunked { chunk_size } => {
                self.write_settings_chunked(packed, chunk_size)?;
            }
            SettingsTransfer::ChunkedDecoded { chunk_size } => {
                self.write_settings_chunked_decoded(packed, chunk_size)?;
            }
        }

        info!(len = packed.len(), profile = self.profile.name(), "wrote settings");
        Ok(())
    }

    fn write_settings_chunked(&mut self, packed: &[u8], chunk_size: usize) -> Result<()> {
        let code = self.code(Command::WriteSettings)?;
        let encoded = gemwire_teeth::encode(packed);
        self.checked_chunk_count(encoded.len(), chunk_size)?;

        let mut payload = Vec::with_capacity(chunk_size + 1);
        for (index, chunk) in split_chunks(&encoded, chunk_size).enumerate() {
            payload.clear();
            payload.push(index as u8);
            payload.extend_from_slice(chunk);
            // The acknowledgement carries nothing we check.
            self.send_command_expect_response(code, Payload::Raw(&payload), ResponseMode::Raw)?;
            trace!(index, "settings chunk acknowledged");
        }
        Ok(())
    }

    fn write_settings_chunked_decoded(&mut self, packed: &[u8], chunk_size: usize) -> Result<()> {
        let code = self.code(Command::WriteSettings)?;
        self.checked_chunk_count(gemwire_teeth::encoded_length(packed.len()), chunk_size)?;
        let piece = chunk_size / gemwire_teeth::GROUP_SIZE * gemwire_teeth::BYTES_PER_GROUP;

        let mut payload = BytesMut::with_capacity(chunk_size + 1);
        for (index, chunk) in packed.chunks(piece).enumerate() {
            payload.clear();
            payload.put_u8(index as u8);
            gemwire_teeth::encode_into(chunk, &mut payload);
            self.send_command_expect_response(code, Payload::Raw(&payload), ResponseMode::Raw)?;
            trace!(index, "settings chunk acknowledged");
        }
        Ok(())
    }

    fn checked_chunk_count(&self, encoded_len: usize, chunk_size: usize) -> Result<usize> {
        let count = chunk_count(encoded_len, chunk_size);
        if count > MAX_CHUNKS {
            return Err(DeviceError::InvalidProfile(format!(
                "{}: {count} chunks of {chunk_size} bytes exceed the {MAX_CHUNKS} addressable",
                self.profile.name()
            )));
        }
        Ok(count)
    }

    /// Erase stored settings back to firmware defaults.
    pub fn reset_settings(&mut self) -> Result<()> {
        self.command(Command::ResetSettings, Payload::Empty)?;
        info!("settings reset to defaults");
        Ok(())
    }

    /// Restart the firmware. This also leaves calibration mode.
    pub fn soft_reset(&mut self) -> Result<()> {
        self.command(Command::SoftReset, Payload::Empty)?;
        info!("soft reset requested");
        Ok(())
    }

    /// Reboot into the USB bootloader. The MIDI port goes away.
    pub fn reset_into_bootloader(&mut self) -> Result<()> {
        self.command(Command::ResetIntoBootloader, Payload::Empty)?;
        info!("bootloader reset requested");
        Ok(())
    }

    /// Switch the device into calibration mode.
    pub fn enter_calibration_mode(&mut self) -> Result<()> {
        self.command(Command::EnterCalibration, Payload::Empty)?;
        info!("entered calibration mode");
        Ok(())
    }

    /// Leave calibration mode. The firmware has no dedicated command, so this
    /// is a soft reset.
    pub fn exit_calibration_mode(&mut self) -> Result<()> {
        self.soft_reset()
    }

    /// Sample one ADC channel.
    pub fn read_adc(&mut self, channel: u8) -> Result<u16> {
        let payload = self.request(
            Command::ReadAdc,
            Payload::Raw(&[channel]),
            ResponseMode::Decoded,
        )?;
        let bytes: [u8; 2] = payload[..]
            .try_into()
            .map_err(|_| DeviceError::MalformedResponse {
                command: Command::ReadAdc,
                expected: 2,
                actual: payload.len(),
            })?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Set the four DAC codes directly.
    pub fn set_dac(&mut self, codes: [u16; 4]) -> Result<()> {
        let mut data = BytesMut::with_capacity(8);
        for code in codes {
            data.put_u16(code);
        }
        self.command(Command::SetDac, Payload::Teeth(&data))
    }

    /// Set one DAC output on firmware that addresses channels singly.
    pub fn set_dac_channel(&mut self, channel: u8, code: u16, vref: u8) -> Result<()> {
        let mut data = BytesMut::with_capacity(4);
        data.put_u8(channel);
        data.put_u16(code);
        data.put_u8(vref);
        self.command(Command::SetDacChannel, Payload::Teeth(&data))
    }

    /// Set an oscillator's timer period directly.
    pub fn set_period(&mut self, channel: u8, period: u32) -> Result<()> {
        let mut data = BytesMut::with_capacity(5);
        data.put_u8(channel);
        data.put_u32(period);
        self.command(Command::SetPeriod, Payload::Teeth(&data))
    }

    /// Set an oscillator's frequency in hertz.
    pub fn set_frequency(&mut self, channel: u8, hertz: f64) -> Result<()> {
        let raw = fix16_to_raw(hertz).ok_or_else(|| {
            DeviceError::InvalidArgument(format!("frequency {hertz} does not fit fix16"))
        })?;
        let mut data = BytesMut::with_capacity(5);
        data.put_u8(channel);
        data.put_i32(raw);
        self.command(Command::SetFrequency, Payload::Teeth(&data))
    }

    /// Tell the firmware the measured frequency of its 8 MHz oscillator.
    pub fn set_osc8m_freq(&mut self, hertz: u32) -> Result<()> {
        self.command(Command::SetOsc8mFreq, Payload::Teeth(&hertz.to_be_bytes()))
    }

    /// Store the ADC gain correction, where 2048 is unity.
    pub fn write_adc_gain(&mut self, gain: u16) -> Result<()> {
        self.command(Command::WriteAdcGain, Payload::Teeth(&gain.to_be_bytes()))
    }

    /// Store the ADC offset correction in codes.
    pub fn write_adc_offset(&mut self, offset: i16) -> Result<()> {
        self.command(Command::WriteAdcOffset, Payload::Teeth(&offset.to_be_bytes()))
    }

    pub fn enable_adc_correction(&mut self) -> Result<()> {
        self.command(Command::EnableAdcCorrection, Payload::Empty)
    }

    pub fn disable_adc_correction(&mut self) -> Result<()> {
        self.command(Command::DisableAdcCorrection, Payload::Empty)
    }

    /// Stage one entry of the ramp lookup table and wait for the ack.
    pub fn write_lut_entry(&mut self, entry: u8, period: u32, castor: u16, pollux: u16) -> Result<()> {
        let mut data = BytesMut::with_capacity(9);
        data.put_u8(entry);
        data.put_u32(period);
        data.put_u16(castor);
        data.put_u16(pollux);
        self.request(Command::WriteLutEntry, Payload::Teeth(&data), ResponseMode::Raw)?;
        Ok(())
    }

    /// Commit the staged lookup table to flash.
    pub fn write_lut(&mut self) -> Result<()> {
        self.command(Command::WriteLut, Payload::Empty)?;
        info!("lookup table written");
        Ok(())
    }

    pub fn erase_lut(&mut self) -> Result<()> {
        self.command(Command::EraseLut, Payload::Empty)?;
        info!("lookup table erased");
        Ok(())
    }

    /// Start the telemetry stream.
    pub fn enable_monitor(&mut self) -> Result<()> {
        self.command(Command::Monitor, Payload::Raw(&[1]))
    }

    /// Stop the telemetry stream.
    pub fn disable_monitor(&mut self) -> Result<()> {
        self.command(Command::Monitor, Payload::Raw(&[0]))
    }

    /// Block until the next telemetry update arrives.
    pub fn next_monitor_update(&mut self) -> Result<Record> {
        let frame = self.receive_frame()?;
        let decoded = gemwire_teeth::decode(&frame.payload)?;
        let expected = self.monitor_layout.packed_size();
        if decoded.len() != expected {
            return Err(DeviceError::MalformedResponse {
                command: Command::Monitor,
                expected,
                actual: decoded.len(),
            });
        }
        Ok(Record::unpack(Arc::clone(&self.monitor_layout), &decoded)?)
    }

    /// Enable the telemetry stream and iterate over updates.
    ///
    /// The stream is disabled again when the returned session is dropped.
    pub fn monitor(&mut self) -> Result<MonitorSession<'_, T>> {
        self.enable_monitor()?;
        info!("monitor stream enabled");
        Ok(MonitorSession { device: self })
    }
}

impl<T> std::fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("profile", &self.profile.name())
            .field("device_marker", &self.frame_config.device_marker)
            .field("settings_layout", &self.settings_layout.name())
            .finish()
    }
}

/// Telemetry updates from an enabled monitor stream.
pub struct MonitorSession<'a, T: Transport> {
    device: &'a mut Device<T>,
}

impl<T: Transport> MonitorSession<'_, T> {
    /// Block until the next update.
    pub fn next_update(&mut self) -> Result<Record> {
        self.device.next_monitor_update()
    }
}

impl<T: Transport> Iterator for MonitorSession<'_, T> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.device.next_monitor_update() {
            Err(DeviceError::Transport(gemwire_transport::TransportError::Closed)) => None,
            other => Some(other),
        }
    }
}

impl<T: Transport> Drop for MonitorSession<'_, T> {
    fn drop(&mut self) {
        match self.device.disable_monitor() {
            Ok(()) => info!("monitor stream disabled"),
            Err(err) => warn!(error = %err, "failed to disable monitor stream"),
        }
    }
}
