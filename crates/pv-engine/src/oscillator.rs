//! Oscillator contract.
//!
//! The engine drives tone generators only through this trait; concrete
//! implementations live with the instrument layer and are chosen at
//! construction time.

/// Core trait for the tone generator feeding a voice.
///
/// `set_freq` establishes the base frequency. `mod_freq` layers a
/// short-lived multiplicative ratio on top of it — glide and vibrato
/// are routed here every dynamics tick, so implementations must treat
/// the ratio as volatile, not as a retune.
pub trait Oscillator {
    /// Set the base frequency in Hz.
    fn set_freq(&mut self, freq: f32);

    /// Current base frequency in Hz.
    fn freq(&self) -> f32;

    /// Apply an instantaneous pitch ratio on top of the base frequency.
    fn mod_freq(&mut self, ratio: f32);

    /// Note-on.
    fn trigger(&mut self) {}

    /// Note-off.
    fn release(&mut self) {}

    /// Advance one control tick.
    fn dynamics(&mut self) {}

    /// Fill `buffer` with the next block of samples.
    fn output(&mut self, buffer: &mut [i8]);
}
