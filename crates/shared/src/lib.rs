//! Shared types, errors, and configuration for Cashbook.
//!
//! This crate provides common pieces used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - The bearer-token principal capability consumed by the API layer

pub mod config;
pub mod error;
pub mod jwt;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtError, JwtService};
