use std::sync::{Arc, OnceLock};

use crate::layout::FieldKind::{Bool, Fix16, I16, U16, U32, U8};
use crate::layout::{FieldKind, FieldSpec, RecordLayout};
use crate::record::Value;

/// Name of the persistent settings layout.
pub const GEM_SETTINGS: &str = "gem_settings";

/// Packed size of [`GEM_SETTINGS`].
pub const GEM_SETTINGS_PACKED_SIZE: usize = 80;

/// Name of the monitor telemetry layout.
pub const GEM_MONITOR_UPDATE: &str = "gem_monitor_update";

/// Packed size of [`GEM_MONITOR_UPDATE`].
pub const GEM_MONITOR_UPDATE_PACKED_SIZE: usize = 66;

type FieldTable = [(&'static str, FieldKind, Value)];

const SETTINGS_FIELDS: &FieldTable = &[
    ("adc_gain_corr", U16, Value::Int(2048)),
    ("adc_offset_corr", I16, Value::Int(0)),
    ("led_brightness", U16, Value::Int(127)),
    ("castor_knob_min", Fix16, Value::Fix16(-1.2)),
    ("castor_knob_max", Fix16, Value::Fix16(1.2)),
    ("pollux_knob_min", Fix16, Value::Fix16(-1.2)),
    ("pollux_knob_max", Fix16, Value::Fix16(1.2)),
    ("chorus_max_intensity", Fix16, Value::Fix16(0.05)),
    ("lfo_1_frequency", Fix16, Value::Fix16(0.2)),
    ("cv_offset_error", Fix16, Value::Fix16(0.0)),
    ("cv_gain_error", Fix16, Value::Fix16(1.0)),
    ("removed_smooth_initial_gain", Fix16, Value::Fix16(0.1)),
    ("removed_smooth_sensitivity", Fix16, Value::Fix16(30.0)),
    ("zero_detection_threshold", U16, Value::Int(350)),
    ("removed_castor_lfo_pwm", Bool, Value::Bool(false)),
    ("removed_pollux_lfo_pwm", Bool, Value::Bool(false)),
    ("pitch_knob_nonlinearity", Fix16, Value::Fix16(0.6)),
    ("base_cv_offset", Fix16, Value::Fix16(1.0)),
    ("lfo_2_frequency_ratio", Fix16, Value::Fix16(2.0)),
    ("lfo_1_waveshape", U8, Value::Int(0)),
    ("lfo_2_waveshape", U8, Value::Int(0)),
    ("lfo_1_factor", Fix16, Value::Fix16(1.0)),
    ("lfo_2_factor", Fix16, Value::Fix16(0.0)),
    ("pulse_width_bitmask", U16, Value::Int(4095)),
    ("osc8m_freq", U32, Value::Int(8_000_000)),
    ("zero_detection_enabled", Bool, Value::Bool(true)),
    ("quantization_enabled", Bool, Value::Bool(true)),
];

const MONITOR_FIELDS: &FieldTable = &[
    ("mode", U8, Value::Int(0)),
    ("tweaking", Bool, Value::Bool(false)),
    ("lfo_knob", U16, Value::Int(0)),
    ("tweak_lfo_knob", U16, Value::Int(0)),
    ("castor_pitch_knob", U16, Value::Int(0)),
    ("castor_pitch_cv", U16, Value::Int(0)),
    ("castor_pulse_knob", U16, Value::Int(0)),
    ("castor_pulse_cv", U16, Value::Int(0)),
    ("castor_tweak_pitch_knob", U16, Value::Int(0)),
    ("castor_tweak_pulse_knob", U16, Value::Int(0)),
    ("castor_pitch_behavior", U8, Value::Int(0)),
    ("castor_pitch", Fix16, Value::Fix16(0.0)),
    ("castor_pulse_width", U16, Value::Int(0)),
    ("castor_period", U32, Value::Int(0)),
    ("castor_ramp", U16, Value::Int(0)),
    ("pollux_pitch_knob", U16, Value::Int(0)),
    ("pollux_pitch_cv", U16, Value::Int(0)),
    ("pollux_pulse_knob", U16, Value::Int(0)),
    ("pollux_pulse_cv", U16, Value::Int(0)),
    ("pollux_tweak_pitch_knob", U16, Value::Int(0)),
    ("pollux_tweak_pulse_knob", U16, Value::Int(0)),
    ("pollux_reference_pitch", Fix16, Value::Fix16(0.0)),
    ("pollux_pitch_behavior", U8, Value::Int(0)),
    ("pollux_pitch", Fix16, Value::Fix16(0.0)),
    ("pollux_pulse_width", U16, Value::Int(0)),
    ("pollux_period", U32, Value::Int(0)),
    ("pollux_ramp", U16, Value::Int(0)),
    ("loop_time", U16, Value::Int(0)),
    ("animation_time", U16, Value::Int(0)),
    ("sample_time", U16, Value::Int(0)),
];

fn build(name: &str, table: &FieldTable) -> Arc<RecordLayout> {
    let fields = table
        .iter()
        .map(|(field, kind, default)| FieldSpec::new(*field, *kind).with_default(*default))
        .collect();
    Arc::new(RecordLayout::from_checked(name.to_string(), fields))
}

/// Gemini persistent settings, 80 bytes.
pub fn gem_settings() -> Arc<RecordLayout> {
    static LAYOUT: OnceLock<Arc<RecordLayout>> = OnceLock::new();
    Arc::clone(LAYOUT.get_or_init(|| build(GEM_SETTINGS, SETTINGS_FIELDS)))
}

/// Gemini monitor telemetry, 66 bytes.
pub fn gem_monitor_update() -> Arc<RecordLayout> {
    static LAYOUT: OnceLock<Arc<RecordLayout>> = OnceLock::new();
    Arc::clone(LAYOUT.get_or_init(|| build(GEM_MONITOR_UPDATE, MONITOR_FIELDS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn builtins_pass_validation() {
        for layout in [gem_settings(), gem_monitor_update()] {
            let rebuilt = RecordLayout::new(layout.name(), layout.fields().to_vec()).unwrap();
            assert_eq!(rebuilt, *layout);
        }
    }

    #[test]
    fn packed_sizes() {
        assert_eq!(gem_settings().packed_size(), GEM_SETTINGS_PACKED_SIZE);
        assert_eq!(
            gem_monitor_update().packed_size(),
            GEM_MONITOR_UPDATE_PACKED_SIZE
        );
    }

    #[test]
    fn settings_defaults_pack_to_known_bytes() {
        let packed = Record::new(gem_settings()).pack();
        assert_eq!(packed.len(), 80);
        assert_eq!(&packed[0..2], &[0x08, 0x00]);
        assert_eq!(&packed[4..6], &[0x00, 0x7F]);
        // castor_knob_min = -1.2
        assert_eq!(&packed[6..10], &[0xFF, 0xFE, 0xCC, 0xCD]);
        // osc8m_freq = 8 MHz, followed by the two trailing flags.
        assert_eq!(&packed[74..78], &[0x00, 0x7A, 0x12, 0x00]);
        assert_eq!(&packed[78..80], &[0x01, 0x01]);
    }

    #[test]
    fn settings_offsets() {
        let layout = gem_settings();
        assert_eq!(layout.offset_of("zero_detection_threshold"), Some(46));
        assert_eq!(layout.offset_of("lfo_1_waveshape"), Some(62));
        assert_eq!(layout.offset_of("osc8m_freq"), Some(74));
    }

    #[test]
    fn monitor_update_unpacks() {
        let mut bytes = vec![0u8; GEM_MONITOR_UPDATE_PACKED_SIZE];
        bytes[0] = 2;
        bytes[1] = 1;
        // castor_pitch at offset 19: 1.5
        bytes[19..23].copy_from_slice(&[0x00, 0x01, 0x80, 0x00]);
        // sample_time is the last field
        bytes[64..66].copy_from_slice(&[0x01, 0x02]);

        let record = Record::unpack(gem_monitor_update(), &bytes).unwrap();
        assert_eq!(record.get("mode"), Some(Value::Int(2)));
        assert_eq!(record.get("tweaking"), Some(Value::Bool(true)));
        assert_eq!(record.get("castor_pitch"), Some(Value::Fix16(1.5)));
        assert_eq!(record.get("sample_time"), Some(Value::Int(0x0102)));
    }

    #[test]
    fn shared_instances() {
        assert!(Arc::ptr_eq(&gem_settings(), &gem_settings()));
    }
}
