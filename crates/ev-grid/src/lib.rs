//! Proximity matching and household approval engine.
//!
//! The catalog tracks states, districts, stations and households. Households reach the
//! catalog either through manual entry or through the application workflow, which assigns
//! the nearest in-district station within a radius on approval.

pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;
pub mod matching;
pub mod queries;
pub mod seed;
pub mod telemetry;
pub mod workflows;

pub use error::FailureKind;
