//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for key analysis:
//! - Harmonic/percussive separation
//! - Band-pass filtering
//! - RMS energy gating
//! - Channel mixing (multi-channel to mono)

pub mod bandpass;
pub mod channel_mixer;
pub mod hpss;
pub mod silence;
