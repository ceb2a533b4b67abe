//! # Cabinet Common Library
//!
//! Shared code for the cabinet notification crates including:
//! - Error type shared by configuration and startup code
//! - Configuration loading (CLI → environment → TOML → compiled defaults)
//! - Viewer roles (artist, DJ, producer, radio, venue cabinets)
//! - Server-sent event wire frames

pub mod config;
pub mod error;
pub mod roles;
pub mod sse;

pub use error::{Error, Result};
pub use roles::CabinetRole;
