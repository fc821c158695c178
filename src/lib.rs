//! Param Link
//!
//! MIDI learn for typed application parameters: an operator focuses a
//! parameter, moves a knob, slider or button, and from then on that control
//! drives the parameter. Links are persisted as JSON.

pub mod cli;
pub mod config;
pub mod engine;
pub mod focus;
pub mod ingest;
pub mod input;
pub mod midi;
pub mod params;
pub mod paths;
