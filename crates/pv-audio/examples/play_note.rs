//! Plays a short glided phrase through the default audio device.
//!
//! Usage:
//!   cargo run --example play_note

use pv_audio::{AudioOutput, CpalOutput};
use pv_core::{Tuning, BLOCK_SIZE};
use pv_engine::{Oscillator, ShiftFilter, Voice};

/// Square-wave oscillator for the demo. Real instruments supply their
/// own implementation of the contract; the engine never ships one.
struct PulseOsc {
    sample_rate: f32,
    freq: f32,
    ratio: f32,
    phase: f32,
}

impl PulseOsc {
    fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            freq: 0.0,
            ratio: 1.0,
            phase: 0.0,
        }
    }
}

impl Oscillator for PulseOsc {
    fn set_freq(&mut self, freq: f32) {
        self.freq = freq;
    }

    fn freq(&self) -> f32 {
        self.freq
    }

    fn mod_freq(&mut self, ratio: f32) {
        self.ratio = ratio;
    }

    fn output(&mut self, buffer: &mut [i8]) {
        let step = (self.freq * self.ratio) / self.sample_rate;
        for sample in buffer.iter_mut() {
            self.phase += step;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            *sample = if self.phase < 0.5 { 96 } else { -96 };
        }
    }
}

fn main() {
    let (mut output, consumer) = CpalOutput::new().unwrap_or_else(|e| {
        eprintln!("Failed to open audio device: {}", e);
        std::process::exit(1);
    });
    output.build_stream(consumer).unwrap_or_else(|e| {
        eprintln!("Failed to start audio stream: {}", e);
        std::process::exit(1);
    });
    output.start().expect("start playback");

    let sample_rate = output.sample_rate();
    let ticks_per_second = sample_rate as usize / BLOCK_SIZE;
    println!("Device rate: {} Hz ({} ticks/s)", sample_rate, ticks_per_second);

    let mut osc = PulseOsc::new(sample_rate as f32);
    let mut voice = Voice::new(Tuning::default());

    // A soft pluck with a slow wobble and a dark filter
    voice.envelope.set_attack(30);
    voice.envelope.set_decay(80);
    voice.envelope.set_sustain(180);
    voice.envelope.set_release(90);
    voice.vibrato.set_rate(40);
    voice.vibrato.set_depth(48);
    voice.vibrato.set_fade(60);
    voice.set_glide_speed(120);
    voice.effects.append(Box::new(ShiftFilter::new()));

    let mut buffer = [0i8; BLOCK_SIZE];
    let mut run = |voice: &mut Voice, osc: &mut PulseOsc, out: &mut CpalOutput, ticks: usize| {
        for _ in 0..ticks {
            voice.dynamics(osc);
            voice.render(&mut buffer, osc);
            for &sample in buffer.iter() {
                out.write_spin(sample);
            }
        }
    };

    // Glide up a little phrase, then let the release ring out
    for &key in &[45u8, 52, 57, 64, 57, 45] {
        voice.note_on(key, &mut osc);
        run(&mut voice, &mut osc, &mut output, ticks_per_second / 2);
    }
    voice.note_off(&mut osc);
    run(&mut voice, &mut osc, &mut output, ticks_per_second);

    output.stop().expect("stop playback");
}
