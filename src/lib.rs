//! Awakening enhancement cost simulator.
//!
//! Replays the ten-tier awakening ladder of a mobile game — per-tier success
//! rates, pity energy, blessing multipliers, wards against downgrades and
//! the two guaranteed forge paths — thousands of times, and reduces the runs
//! to cost percentiles, histograms and budget survival curves.

pub mod cli;
pub mod export;
pub mod monte_carlo;
pub mod parallel;
pub mod sim;
pub mod stats;
