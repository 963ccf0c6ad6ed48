//! services/api/src/adapters/mod.rs
//!
//! Concrete implementations of the core service ports.

pub mod db;
pub mod google;
