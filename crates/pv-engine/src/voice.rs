//! Voice: one oscillator's complete signal path.
//!
//! A voice owns its amplitude envelope, tremolo, vibrato, and effects
//! chain, but not its oscillator — the instrument layer owns that and
//! lends it to every call that needs it. Per control tick the voice
//! cascades `dynamics()` through its members, derives the volume segue
//! target and the instantaneous pitch ratio, and per render block it
//! applies the effects chain and the anti-click segue.

use pv_core::{apply_gain, effective_volume, Tuning, UNITY_GAIN};

use crate::effects::EffectsLoop;
use crate::envelope::Adsr;
use crate::lfo::{Tremolo, Vibrato};
use crate::oscillator::Oscillator;

/// Largest per-sample change of the instantaneous volume, in 9-bit
/// fixed-point units. Any volume edit, however large, is ramped at
/// this slope so it can never land as an audible step.
const SEGUE_STEP: u16 = 2;

/// Direction of an in-progress glide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GlideDirection {
    Off,
    Up,
    Down,
}

/// A single voice: volume staging, portamento, modulation routing, and
/// block rendering around an externally owned oscillator.
pub struct Voice {
    // Volume staging
    local_volume: u8,
    global_volume: u8,
    /// 9-bit product of the two levels (256 ≡ unity).
    effective_volume: u16,
    /// Gain actually applied to the current sample.
    instantaneous_volume: u16,
    /// Where the segue is headed; refreshed every dynamics tick.
    segue_target_volume: u16,
    muted: bool,

    // Portamento
    glide_speed: u8,
    glide_direction: GlideDirection,
    /// Ratio currently applied to the oscillator's base frequency;
    /// drifts multiplicatively toward 1.0 while a glide is active.
    glide_coeff: f32,
    glide_multiplier: f32,

    tuning: Tuning,

    pub envelope: Adsr,
    pub tremolo: Tremolo,
    pub vibrato: Vibrato,
    pub effects: EffectsLoop,
}

impl Voice {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            local_volume: 255,
            global_volume: 255,
            effective_volume: UNITY_GAIN,
            instantaneous_volume: 0,
            segue_target_volume: 0,
            muted: false,
            glide_speed: 0,
            glide_direction: GlideDirection::Off,
            glide_coeff: 1.0,
            glide_multiplier: 1.0,
            tuning,
            envelope: Adsr::new(),
            tremolo: Tremolo::new(),
            vibrato: Vibrato::new(),
            effects: EffectsLoop::new(),
        }
    }

    // --- Notes ---

    /// Key-down: tune (or glide) to the key's pitch, then trigger the
    /// whole signal path.
    pub fn note_on(&mut self, key: u8, osc: &mut dyn Oscillator) {
        let freq = self.tuning.pitch(key);
        self.set_freq(freq, osc);
        osc.trigger();
        self.envelope.trigger();
        self.tremolo.trigger();
        self.vibrato.trigger();
        self.effects.trigger();
    }

    /// Key-up: start the release cascade.
    pub fn note_off(&mut self, osc: &mut dyn Oscillator) {
        self.envelope.release();
        self.effects.release();
        osc.release();
    }

    // --- Volume ---

    pub fn set_local_volume(&mut self, level: u8) {
        self.local_volume = level;
        self.effective_volume = effective_volume(self.local_volume, self.global_volume);
    }

    pub fn set_global_volume(&mut self, level: u8) {
        self.global_volume = level;
        self.effective_volume = effective_volume(self.local_volume, self.global_volume);
    }

    pub fn effective_volume(&self) -> u16 {
        self.effective_volume
    }

    /// A muted voice segues to silence rather than cutting.
    pub fn set_mute(&mut self, mute: bool) {
        self.muted = mute;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    // --- Portamento ---

    /// 0 turns portamento off immediately; any pending glide is
    /// abandoned and the pitch lands on the oscillator's base
    /// frequency.
    pub fn set_glide_speed(&mut self, speed: u8) {
        self.glide_speed = speed;
        if speed == 0 {
            self.glide_direction = GlideDirection::Off;
            self.glide_coeff = 1.0;
            self.glide_multiplier = 1.0;
        } else {
            self.glide_multiplier = directional_multiplier(speed, self.glide_direction);
        }
    }

    pub fn glide_speed(&self) -> u8 {
        self.glide_speed
    }

    /// True while a glide is still converging.
    pub fn glide_active(&self) -> bool {
        self.glide_direction != GlideDirection::Off
    }

    pub fn glide_coeff(&self) -> f32 {
        self.glide_coeff
    }

    /// Retune to `target` Hz. With glide enabled the jump is folded
    /// into the glide coefficient so the audible pitch ramps from
    /// wherever it currently is; without it the retune is immediate.
    pub fn set_freq(&mut self, target: f32, osc: &mut dyn Oscillator) {
        // An untuned oscillator has no pitch to glide from
        if self.glide_speed != 0 && osc.freq() > 0.0 {
            let inst_freq = osc.freq() * self.glide_coeff;
            if inst_freq != target {
                self.glide_direction = if target > inst_freq {
                    GlideDirection::Up
                } else {
                    GlideDirection::Down
                };
                self.glide_coeff = inst_freq / target;
                self.glide_multiplier = directional_multiplier(self.glide_speed, self.glide_direction);
            }
        }
        osc.set_freq(target);
    }

    /// One multiplicative step of the ramp. Completion is by
    /// overshoot: the tick the coefficient crosses 1.0 in the
    /// direction of travel, it snaps there and the glide ends.
    fn advance_glide(&mut self) {
        match self.glide_direction {
            GlideDirection::Off => {}
            GlideDirection::Up => {
                self.glide_coeff *= self.glide_multiplier;
                if self.glide_coeff >= 1.0 {
                    self.finish_glide();
                }
            }
            GlideDirection::Down => {
                self.glide_coeff *= self.glide_multiplier;
                if self.glide_coeff <= 1.0 {
                    self.finish_glide();
                }
            }
        }
    }

    fn finish_glide(&mut self) {
        self.glide_coeff = 1.0;
        self.glide_direction = GlideDirection::Off;
    }

    // --- Control tick ---

    /// Advance the whole voice by one control step. Members tick
    /// first, then the segue target and pitch ratio are derived from
    /// their fresh outputs, ahead of the matching `render` call.
    pub fn dynamics(&mut self, osc: &mut dyn Oscillator) {
        osc.dynamics();
        self.envelope.dynamics();
        self.tremolo.dynamics();
        self.vibrato.dynamics();
        self.effects.dynamics();

        self.segue_target_volume = if self.muted {
            0
        } else {
            (self.effective_volume as f32 * self.envelope.value() * self.tremolo.value()) as u16
        };

        self.advance_glide();
        osc.mod_freq(self.glide_coeff * self.vibrato.value());
    }

    pub fn segue_target_volume(&self) -> u16 {
        self.segue_target_volume
    }

    pub fn instantaneous_volume(&self) -> u16 {
        self.instantaneous_volume
    }

    // --- Render ---

    /// Fill `buffer` from the oscillator, run the effects chain, and
    /// apply the instantaneous volume with the anti-click segue.
    pub fn render(&mut self, buffer: &mut [i8], osc: &mut dyn Oscillator) {
        osc.output(buffer);
        self.effects.process(buffer);

        let target = self.segue_target_volume;
        for sample in buffer.iter_mut() {
            if self.instantaneous_volume != target {
                let diff = target as i32 - self.instantaneous_volume as i32;
                let step = diff.unsigned_abs().min(SEGUE_STEP as u32) as u16;
                if diff > 0 {
                    self.instantaneous_volume += step;
                } else {
                    self.instantaneous_volume -= step;
                }
            }
            *sample = apply_gain(*sample, self.instantaneous_volume);
        }
    }
}

/// Glide multiplier magnitude for a speed code: linear in the code,
/// with a quadratic boost above 210 so the top of the range feels
/// exponential.
fn glide_ratio(speed: u8) -> f32 {
    let mut multiple = speed as f32;
    if speed > 210 {
        let excess = (speed - 210) as f32;
        multiple += excess * excess;
    }
    1.0 + multiple * 0.0001
}

/// Per-tick multiplier for the given travel direction; downward glides
/// use the reciprocal ramp.
fn directional_multiplier(speed: u8, direction: GlideDirection) -> f32 {
    let ratio = glide_ratio(speed);
    if direction == GlideDirection::Down {
        1.0 / ratio
    } else {
        ratio
    }
}
