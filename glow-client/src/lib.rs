//! Client for the Glowmarkt smart-meter data API and the domain types it
//! produces.

pub mod api;
pub mod domain;

pub use api::{GlowApi, GlowError};
