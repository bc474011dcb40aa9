//! Integration test crate for Ethogram Studio.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple ethogram crates to verify they work together.

#[cfg(test)]
mod annotation;

#[cfg(test)]
mod playback;
