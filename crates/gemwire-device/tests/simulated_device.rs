use std::collections::VecDeque;

use bytes::Bytes;
use gemwire_device::{Device, DeviceError, FirmwareProfile, SettingsTransfer};
use gemwire_frame::{decode_frame, encode_frame, Command, CommandTable, DEFAULT_DEVICE_MARKER};
use gemwire_record::{gem_monitor_update, gem_settings, Record, Value};
use gemwire_transport::{Transport, TransportError};

/// A Gemini that keeps settings in memory and answers like the firmware.
struct SimulatedGemini {
    profile: FirmwareProfile,
    settings: Vec<u8>,
    outbox: VecDeque<Bytes>,
    calibration_mode: bool,
    monitor_enabled: bool,
    requests: Vec<u8>,
}

impl SimulatedGemini {
    fn new(profile: FirmwareProfile) -> Self {
        let settings = Record::new(gem_settings()).pack();
        Self {
            profile,
            settings,
            outbox: VecDeque::new(),
            calibration_mode: false,
            monitor_enabled: false,
            requests: Vec::new(),
        }
    }

    fn code(&self, command: Command) -> u8 {
        self.profile.commands().code(command).unwrap()
    }

    fn reply(&mut self, command: u8, payload: &[u8]) {
        let mut buf = bytes::BytesMut::new();
        encode_frame(DEFAULT_DEVICE_MARKER, command, payload, &mut buf).unwrap();
        self.outbox.push_back(buf.freeze());
    }

    fn reply_teeth(&mut self, command: u8, payload: &[u8]) {
        self.reply(command, &gemwire_teeth::encode(payload));
    }

    fn encoded_settings(&self) -> Vec<u8> {
        gemwire_teeth::encode(&self.settings)
    }
}

impl Transport for SimulatedGemini {
    fn send(&mut self, message: &[u8]) -> gemwire_transport::Result<()> {
        let frame = decode_frame(message, DEFAULT_DEVICE_MARKER).unwrap();
        let code = frame.command;
        self.requests.push(code);
        let payload = frame.payload.to_vec();

        let transfer = self.profile.settings_transfer();

        if code == self.code(Command::Hello) {
            self.reply(code, b"gemini-sim 1.0");
        } else if code == self.code(Command::GetSerialNumber) {
            let mut serial: Vec<u8> = (0xA0..0xB0).collect();
            serial.push(4);
            self.reply_teeth(code, &serial);
        } else if code == self.code(Command::ReadSettings) {
            match transfer {
                SettingsTransfer::Chunked { chunk_size: size } => {
                    let index = usize::from(payload[0]);
                    let mut chunk = vec![0u8; size];
                    let encoded = self.encoded_settings();
                    let start = (index * size).min(encoded.len());
                    let end = (start + size).min(encoded.len());
                    chunk[..end - start].copy_from_slice(&encoded[start..end]);
                    self.reply(code, &chunk);
                }
                SettingsTransfer::ChunkedDecoded { .. } => {
                    let piece = transfer.decoded_chunk_size().unwrap();
                    let start = (usize::from(payload[0]) * piece).min(self.settings.len());
                    let end = (start + piece).min(self.settings.len());
                    let chunk = self.settings[start..end].to_vec();
                    self.reply_teeth(code, &chunk);
                }
                SettingsTransfer::SingleShot => {
                    let settings = self.settings.clone();
                    self.reply_teeth(code, &settings);
                }
            }
        } else if code == self.code(Command::WriteSettings) {
            match transfer {
                SettingsTransfer::Chunked { chunk_size: size } => {
                    let index = usize::from(payload[0]);
                    let mut encoded = self.encoded_settings();
                    let data = &payload[1..];
                    encoded[index * size..index * size + data.len()].copy_from_slice(data);
                    self.settings = gemwire_teeth::decode(&encoded).unwrap();
                }
                SettingsTransfer::ChunkedDecoded { .. } => {
                    let piece = transfer.decoded_chunk_size().unwrap();
                    let start = usize::from(payload[0]) * piece;
                    let data = gemwire_teeth::decode(&payload[1..]).unwrap();
                    self.settings[start..start + data.len()].copy_from_slice(&data);
                }
                SettingsTransfer::SingleShot => {
                    self.settings = gemwire_teeth::decode(&payload).unwrap();
                }
            }
            self.reply(code, &[]);
        } else if code == self.code(Command::ResetSettings) {
            self.settings = Record::new(gem_settings()).pack();
        } else if code == self.code(Command::EnterCalibration) {
            self.calibration_mode = true;
        } else if code == self.code(Command::SoftReset) {
            self.calibration_mode = false;
            self.monitor_enabled = false;
        } else if code == self.code(Command::Monitor) {
            self.monitor_enabled = payload == [1];
            if self.monitor_enabled {
                for tick in 0..3u16 {
                    let mut update = Record::new(gem_monitor_update());
                    update.set("loop_time", tick).unwrap();
                    update.set("tweaking", tick % 2 == 1).unwrap();
                    self.reply_teeth(code, &update.pack());
                }
            }
        } else if code == self.code(Command::ReadAdc) {
            let value = 1000u16 + u16::from(payload[0]);
            self.reply_teeth(code, &value.to_be_bytes());
        }
        Ok(())
    }

    fn receive(&mut self) -> gemwire_transport::Result<Bytes> {
        self.outbox.pop_front().ok_or(TransportError::Closed)
    }
}

fn session(profile: FirmwareProfile) -> Device<SimulatedGemini> {
    Device::new(SimulatedGemini::new(profile.clone()), profile)
}

#[test]
fn identify_against_both_profiles() {
    for profile in [FirmwareProfile::legacy(), FirmwareProfile::current()] {
        let mut gemini = session(profile);
        assert_eq!(gemini.firmware_version().unwrap(), "gemini-sim 1.0");
        let serial = gemini.serial_number().unwrap();
        assert_eq!(serial.serial, "a0a1a2a3a4a5a6a7a8a9aaabacadaeaf");
        assert_eq!(serial.hardware_revision, Some(4));
    }
}

#[test]
fn settings_read_modify_write_legacy() {
    let mut gemini = session(FirmwareProfile::legacy());

    let mut settings = gemini.read_settings().unwrap();
    assert_eq!(settings.get("led_brightness"), Some(Value::Int(127)));

    settings.set("led_brightness", 42u16).unwrap();
    settings.set("lfo_1_frequency", 0.5).unwrap();
    settings.set("zero_detection_enabled", false).unwrap();
    gemini.write_settings(&settings).unwrap();

    assert_eq!(gemini.transport().settings, settings.pack());

    let reread = gemini.read_settings().unwrap();
    assert_eq!(reread.get("led_brightness"), Some(Value::Int(42)));
    assert_eq!(reread.get("lfo_1_frequency"), Some(Value::Fix16(0.5)));
    assert_eq!(reread.get("zero_detection_enabled"), Some(Value::Bool(false)));

    // 10 reads, 10 writes, 10 reads.
    let settings_codes: Vec<u8> = gemini
        .transport()
        .requests
        .iter()
        .copied()
        .filter(|code| *code == 0x08 || *code == 0x09)
        .collect();
    assert_eq!(settings_codes.len(), 30);
}

#[test]
fn settings_read_modify_write_current() {
    let mut gemini = session(FirmwareProfile::current());

    let mut settings = gemini.read_settings().unwrap();
    settings.set("osc8m_freq", 8_001_234u32).unwrap();
    gemini.write_settings(&settings).unwrap();

    let reread = gemini.read_settings().unwrap();
    assert_eq!(reread.get("osc8m_freq"), Some(Value::Int(8_001_234)));
    assert_eq!(gemini.transport().requests, vec![0x18, 0x19, 0x18]);
}

#[test]
fn settings_read_modify_write_decoded_per_chunk() {
    let profile = FirmwareProfile::new(
        "per-chunk",
        DEFAULT_DEVICE_MARKER,
        CommandTable::legacy(),
        SettingsTransfer::ChunkedDecoded { chunk_size: 20 },
    )
    .unwrap();
    let mut gemini = session(profile);

    let mut settings = gemini.read_settings().unwrap();
    assert_eq!(settings.get("led_brightness"), Some(Value::Int(127)));
    settings.set("led_brightness", 7u16).unwrap();
    settings.set("lfo_1_frequency", 0.25).unwrap();
    gemini.write_settings(&settings).unwrap();

    assert_eq!(gemini.transport().settings, settings.pack());
    let reread = gemini.read_settings().unwrap();
    assert_eq!(reread, settings);

    // 80 packed bytes in 16-byte pieces: 5 reads, 5 writes, 5 reads.
    let settings_codes = gemini
        .transport()
        .requests
        .iter()
        .filter(|code| **code == 0x08 || **code == 0x09)
        .count();
    assert_eq!(settings_codes, 15);
}

#[test]
fn reset_settings_restores_defaults() {
    let mut gemini = session(FirmwareProfile::current());
    let mut settings = gemini.read_settings().unwrap();
    settings.set("pulse_width_bitmask", 1u16).unwrap();
    gemini.write_settings(&settings).unwrap();

    gemini.reset_settings().unwrap();
    let reread = gemini.read_settings().unwrap();
    assert_eq!(reread.get("pulse_width_bitmask"), Some(Value::Int(4095)));
}

#[test]
fn calibration_mode_round_trip() {
    let mut gemini = session(FirmwareProfile::current());
    gemini.enter_calibration_mode().unwrap();
    assert!(gemini.transport().calibration_mode);
    assert_eq!(gemini.read_adc(3).unwrap(), 1003);
    gemini.exit_calibration_mode().unwrap();
    assert!(!gemini.transport().calibration_mode);
}

#[test]
fn monitor_stream_yields_updates_then_disables() {
    let mut gemini = session(FirmwareProfile::current());
    let loop_times: Vec<Value> = gemini
        .monitor()
        .unwrap()
        .map(|update| update.unwrap().get("loop_time").unwrap())
        .collect();
    assert_eq!(loop_times, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    assert!(!gemini.transport().monitor_enabled);
}

#[test]
fn unsupported_commands_are_reported_per_profile() {
    let mut legacy = session(FirmwareProfile::legacy());
    assert!(matches!(
        legacy.set_osc8m_freq(8_000_000),
        Err(DeviceError::UnsupportedCommand { .. })
    ));

    let mut current = session(FirmwareProfile::current());
    assert!(matches!(
        current.set_period(0, 100),
        Err(DeviceError::UnsupportedCommand { .. })
    ));
    assert!(current.transport().requests.is_empty());
}
