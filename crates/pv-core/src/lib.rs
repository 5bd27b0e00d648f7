//! Core types for the pocketvox synth engine.
//!
//! This crate defines the numeric conventions shared by the whole
//! instrument: the dual fixed-point volume representation, the
//! exponential time expander behind every timed parameter, and the
//! tuning configuration injected into voices.
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod time_scale;
mod tuning;
mod volume;

pub use time_scale::{expand_ticks, MAX_TICKS};
pub use tuning::Tuning;
pub use volume::{apply_gain, effective_volume, unit_from_code, MAX_LEVEL, UNITY_GAIN};

/// Samples per render block. The control (dynamics) rate is the audio
/// sample rate divided by this.
pub const BLOCK_SIZE: usize = 128;
