//! Low-frequency modulators: tremolo (amplitude) and vibrato (pitch).
//!
//! Both ride the same [`Lfo`]: a triangle phase accumulator whose
//! excursion is scaled by a depth code and eased in by a post-trigger
//! fader. Rates and fade times go through the same byte-code expansion
//! as envelope stages.

use pv_core::{expand_ticks, unit_from_code};

/// One audible semitone up, as a frequency ratio.
const SEMITONE_RATIO: f32 = 1.059463;

/// One audible semitone down. Pitch ratios are multiplicative, so the
/// downward coefficient is not the mirror of the upward one.
const INVERSE_SEMITONE_RATIO: f32 = 0.943874;

/// Shared low-frequency oscillator state.
#[derive(Clone, Debug)]
pub struct Lfo {
    /// Cycle phase in [0.0, 1.0).
    phase: f32,
    /// Phase advance per dynamics tick; 0.0 freezes the cycle.
    step: f32,
    /// Excursion scale in [0.0, 1.0].
    depth: f32,
    /// Post-trigger ease-in, 0.0 → 1.0.
    fader: f32,
    /// Fader advance per tick; 0.0 means no fade (fader snaps to 1.0).
    fade_step: f32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            step: 0.0,
            depth: 0.0,
            fader: 1.0,
            fade_step: 0.0,
        }
    }

    /// Cycle length is `expand_ticks(code)` ticks; code 0 freezes the
    /// oscillator.
    pub fn set_rate(&mut self, code: u8) {
        self.step = rate_step(code);
    }

    /// Excursion scale; code 255 is exactly 1.0, otherwise `code / 256`.
    pub fn set_depth(&mut self, code: u8) {
        self.depth = unit_from_code(code);
    }

    /// Fade-in over `expand_ticks(code)` ticks after each trigger;
    /// code 0 disables fading.
    pub fn set_fade(&mut self, code: u8) {
        self.fade_step = rate_step(code);
    }

    /// Restart the cycle (and the fade-in, when configured).
    pub fn trigger(&mut self) {
        self.phase = 0.0;
        self.fader = if self.fade_step == 0.0 { 1.0 } else { 0.0 };
    }

    /// Advance one control tick.
    pub fn dynamics(&mut self) {
        self.phase += self.step;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        if self.fader < 1.0 {
            self.fader = (self.fader + self.fade_step).min(1.0);
        }
    }

    /// Triangle excursion scaled by depth, in [0.0, depth].
    pub fn position(&self) -> f32 {
        let excursion = if self.phase < 0.5 {
            2.0 * self.phase
        } else {
            2.0 * (1.0 - self.phase)
        };
        excursion * self.depth
    }

    pub fn fader(&self) -> f32 {
        self.fader
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }
}

fn rate_step(code: u8) -> f32 {
    if code == 0 {
        0.0
    } else {
        1.0 / expand_ticks(code) as f32
    }
}

/// Periodic amplitude dip: yields a multiplier in [1.0 − depth, 1.0].
#[derive(Clone, Debug)]
pub struct Tremolo {
    lfo: Lfo,
    val: f32,
    muted: bool,
}

impl Default for Tremolo {
    fn default() -> Self {
        Self::new()
    }
}

impl Tremolo {
    pub fn new() -> Self {
        Self {
            lfo: Lfo::new(),
            val: 1.0,
            muted: false,
        }
    }

    pub fn set_rate(&mut self, code: u8) {
        self.lfo.set_rate(code);
    }

    pub fn set_depth(&mut self, code: u8) {
        self.lfo.set_depth(code);
    }

    pub fn set_fade(&mut self, code: u8) {
        self.lfo.set_fade(code);
    }

    pub fn trigger(&mut self) {
        self.lfo.trigger();
    }

    /// Muting pins the multiplier at 1.0 (no attenuation); the cycle
    /// keeps running underneath.
    pub fn set_mute(&mut self, mute: bool) {
        self.muted = mute;
        if mute {
            self.val = 1.0;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn dynamics(&mut self) {
        self.lfo.dynamics();
        if !self.muted {
            self.val = 1.0 - self.lfo.fader() * self.lfo.position();
        }
    }

    /// Current amplitude multiplier.
    pub fn value(&self) -> f32 {
        self.val
    }
}

/// Periodic pitch wobble: yields a frequency ratio within one audible
/// semitone either side of unity.
#[derive(Clone, Debug)]
pub struct Vibrato {
    lfo: Lfo,
    val: f32,
    muted: bool,
}

impl Default for Vibrato {
    fn default() -> Self {
        Self::new()
    }
}

impl Vibrato {
    pub fn new() -> Self {
        Self {
            lfo: Lfo::new(),
            val: 1.0,
            muted: false,
        }
    }

    pub fn set_rate(&mut self, code: u8) {
        self.lfo.set_rate(code);
    }

    pub fn set_depth(&mut self, code: u8) {
        self.lfo.set_depth(code);
    }

    pub fn set_fade(&mut self, code: u8) {
        self.lfo.set_fade(code);
    }

    pub fn trigger(&mut self) {
        self.lfo.trigger();
    }

    /// Muting pins the ratio at 1.0 (no detune).
    pub fn set_mute(&mut self, mute: bool) {
        self.muted = mute;
        if mute {
            self.val = 1.0;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn dynamics(&mut self) {
        self.lfo.dynamics();
        if self.muted {
            return;
        }
        // Center the excursion: spans [-depth, +depth] over one cycle
        let signed = self.lfo.fader() * (2.0 * self.lfo.position() - self.lfo.depth());
        self.val = if signed >= 0.0 {
            1.0 + signed * (SEMITONE_RATIO - 1.0)
        } else {
            1.0 + signed * (1.0 - INVERSE_SEMITONE_RATIO)
        };
    }

    /// Current pitch ratio.
    pub fn value(&self) -> f32 {
        self.val
    }
}
