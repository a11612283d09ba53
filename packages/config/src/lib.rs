// ABOUTME: Configuration constants shared by Tether binaries
// ABOUTME: Environment variable names live here so every package reads the same keys

pub mod constants;

pub use constants::*;
