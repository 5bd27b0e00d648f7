//! Key-to-frequency tuning configuration.
//!
//! Voices never consult a global tuning instance; the instrument layer
//! constructs one `Tuning` and passes it into each voice.

/// MIDI key number of the reference pitch A4.
const REFERENCE_KEY: u8 = 69;

/// Equal-temperament tuning anchored at A4.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    a4: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self { a4: 440.0 }
    }
}

impl Tuning {
    /// Tuning with a non-standard A4 reference (e.g. 432.0).
    pub fn with_a4(a4: f32) -> Self {
        Self { a4 }
    }

    /// Frequency in Hz for a MIDI key number, 12-TET.
    pub fn pitch(&self, key: u8) -> f32 {
        let semitones = key as f32 - REFERENCE_KEY as f32;
        self.a4 * libm::powf(2.0, semitones / 12.0)
    }
}
