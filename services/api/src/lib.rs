//! services/api/src/lib.rs
//!
//! Library root for the NearServe API service.

pub mod adapters;
pub mod config;
pub mod error;
pub mod token;
pub mod web;
