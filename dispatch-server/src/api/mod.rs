//! HTTP API handlers for dispatch-server

pub mod bin;
pub mod buildinfo;
pub mod bulk;
pub mod documents;
pub mod drivers;
pub mod health;
pub mod scans;
pub mod settings;

pub use bin::bin_routes;
pub use bulk::bulk_routes;
pub use documents::document_routes;
pub use drivers::driver_routes;
pub use health::health_routes;
pub use scans::scan_routes;
pub use settings::settings_routes;
