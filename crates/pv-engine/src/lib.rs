//! Real-time synthesis engine for the pocketvox instrument.
//!
//! One voice's complete signal path: ADSR amplitude shaping, tremolo
//! and vibrato modulation, portamento, an ordered effects chain, and
//! an anti-click volume segue, all advanced by a fixed-rate dynamics
//! tick and rendered block by block.
//!
//! The engine never allocates or blocks on the tick/render path.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod effects;
mod envelope;
mod lfo;
mod master;
mod oscillator;
mod voice;

pub use effects::{Effect, EffectsLoop, ShiftFilter};
pub use envelope::{Adsr, AutoAdsr, EnvelopeCtl, Phase};
pub use lfo::{Lfo, Tremolo, Vibrato};
pub use master::{EnvelopeBank, EnvelopeKey, MasterAdsr, MAX_SLAVES};
pub use oscillator::Oscillator;
pub use voice::Voice;
