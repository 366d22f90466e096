//! Shared test helpers
//!
//! - [`fit`] - scripted fit engine
//! - [`fixtures`] - geometry, hit and seed builders

#![allow(dead_code)]

pub mod fit;
pub mod fixtures;
