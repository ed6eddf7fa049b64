//! Report builder shared model
//!
//! Field compatibility rules, the report configuration model with its mutation
//! operations, wire DTOs and the response normalization boundary.

pub mod config;
pub mod dto;
pub mod field;
pub mod normalize;

pub use config::*;
pub use dto::*;
pub use field::*;
