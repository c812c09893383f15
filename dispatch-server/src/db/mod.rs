//! Database access layer for dispatch-server

pub mod drivers;
pub mod lists;
pub mod scans;
pub mod settings;
