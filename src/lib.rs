//! `fisherface` library crate.
//!
//! Face recognition with Fisherfaces: PCA to (P−C) dimensions, Fisher's
//! linear discriminant to C−1 dimensions, then nearest-neighbour matching.
//!
//! The binary (`fisherface`) is a thin wrapper around this library so that:
//!
//! - training and recognition are testable without spawning processes
//! - a trained `Model` can be embedded and shared read-only across threads

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod recognize;
pub mod report;
