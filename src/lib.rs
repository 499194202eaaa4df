//! Cultsim - Cultivation Progression Simulation Library
//!
//! Advances a character's skills and cultivation track day-by-day against
//! staged experience catalogs. Fully deterministic: the same character,
//! catalog, and time allocation always produce the same final state.

pub mod allocation;
pub mod catalog;
pub mod character;
pub mod constants;
pub mod engine;
pub mod error;
pub mod report;
