//! Fixed-point volume arithmetic.
//!
//! Two scales coexist and the asymmetry is load-bearing:
//!
//! - user-facing levels are 8-bit, where 255 ≡ 1.0;
//! - derived gains are 9-bit, where 256 ≡ 1.0.
//!
//! Full volume must be *exactly* representable (a gain of 256 passes
//! samples through unchanged), so a level of 255 widens to 256 before
//! any multiply; every other level keeps its literal 0–255/256 value.

/// Full-scale 8-bit level (≡ 1.0 on the user-facing scale).
pub const MAX_LEVEL: u8 = 255;

/// Unity 9-bit gain (≡ 1.0 on the derived scale).
pub const UNITY_GAIN: u16 = 256;

/// Widen an 8-bit level to the 9-bit gain scale: 255 becomes 256,
/// everything else is literal.
fn widen_level(level: u8) -> u16 {
    if level == MAX_LEVEL {
        UNITY_GAIN
    } else {
        level as u16
    }
}

/// Combine local and global volume levels into one 9-bit gain.
///
/// Both levels are widened, multiplied, and the high byte of the 16-bit
/// product is kept. The discarded low byte is an intentional precision
/// trade-off inherited from the instrument's regression baseline; do not
/// round.
pub fn effective_volume(local: u8, global: u8) -> u16 {
    ((widen_level(local) as u32 * widen_level(global) as u32) >> 8) as u16
}

/// Scale one sample by a 9-bit gain, keeping the high byte of the
/// product. A gain of [`UNITY_GAIN`] is an exact pass-through.
pub fn apply_gain(sample: i8, gain: u16) -> i8 {
    ((sample as i32 * gain as i32) >> 8) as i8
}

/// Convert a byte-coded unit parameter (sustain level, LFO depth) to
/// [0.0, 1.0]: code 255 is exactly 1.0, otherwise `code / 256`.
pub fn unit_from_code(code: u8) -> f32 {
    if code == MAX_LEVEL {
        1.0
    } else {
        code as f32 / 256.0
    }
}
