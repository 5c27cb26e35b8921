//! Utility modules and shared functionality

pub mod config;
pub mod errors;
pub mod http;
pub mod text;
