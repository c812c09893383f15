//! # Dispatch Common Library
//!
//! Shared code for the dispatch slip service including:
//! - QR payload parsing and format detection
//! - Bulk serial-number generation
//! - Lessee/document profile defaults
//! - Database initialization and models
//! - Configuration loading and root folder resolution

pub mod config;
pub mod db;
pub mod error;
pub mod profile;
pub mod serial;
pub mod slip;
pub mod time;

pub use error::{Error, Result};
pub use slip::{parse_qr_data, DispatchSlip, SlipFormat};
