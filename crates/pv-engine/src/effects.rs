//! Effect chain: uniform lifecycle hooks plus in-place stream
//! processing.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Capability trait for the audio-buffer processors in a voice's chain.
///
/// Muting only suppresses `process`; every lifecycle hook keeps firing
/// so a muted effect's internal state stays current and unmuting never
/// produces a stale jump.
pub trait Effect {
    /// Short identifier, used by the console layer for dispatch.
    fn name(&self) -> &'static str;

    /// Note-on.
    fn trigger(&mut self) {}

    /// Note-off.
    fn release(&mut self) {}

    /// Advance one control tick.
    fn dynamics(&mut self) {}

    fn set_mute(&mut self, mute: bool);

    fn is_muted(&self) -> bool;

    /// Transform `buffer` in place.
    fn process(&mut self, buffer: &mut [i8]);
}

/// Ordered, append-only chain of effects.
///
/// The loop owns its effects. Processing composes them strictly in
/// append order, each consuming and producing the same buffer in
/// place; appending happens at patch-edit time, never on the render
/// path.
#[derive(Default)]
pub struct EffectsLoop {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectsLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect at the tail of the chain.
    pub fn append(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Effect + '_)> {
        self.effects.get_mut(index).map(|e| &mut **e as &mut dyn Effect)
    }

    pub fn trigger(&mut self) {
        for effect in &mut self.effects {
            effect.trigger();
        }
    }

    pub fn release(&mut self) {
        for effect in &mut self.effects {
            effect.release();
        }
    }

    /// Ticks every node, muted or not.
    pub fn dynamics(&mut self) {
        for effect in &mut self.effects {
            effect.dynamics();
        }
    }

    /// Run the buffer through the chain, skipping the transform of
    /// muted nodes.
    pub fn process(&mut self, buffer: &mut [i8]) {
        for effect in &mut self.effects {
            if !effect.is_muted() {
                effect.process(buffer);
            }
        }
    }
}

/// One-pole low-pass filter built from integer shifts, cheap enough
/// for the 8-bit render path: `state += (input - state) >> shift`.
/// Larger shifts filter harder.
pub struct ShiftFilter {
    state: i16,
    shift: u8,
    muted: bool,
}

impl Default for ShiftFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftFilter {
    pub fn new() -> Self {
        Self {
            state: 0,
            shift: 2,
            muted: false,
        }
    }

    /// Cutoff control, clamped to 1..=7.
    pub fn set_shift(&mut self, shift: u8) {
        self.shift = shift.clamp(1, 7);
    }

    pub fn shift(&self) -> u8 {
        self.shift
    }
}

impl Effect for ShiftFilter {
    fn name(&self) -> &'static str {
        "lpf"
    }

    fn trigger(&mut self) {
        self.state = 0;
    }

    fn set_mute(&mut self, mute: bool) {
        self.muted = mute;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn process(&mut self, buffer: &mut [i8]) {
        for sample in buffer.iter_mut() {
            self.state += (*sample as i16 - self.state) >> self.shift;
            *sample = self.state as i8;
        }
    }
}
