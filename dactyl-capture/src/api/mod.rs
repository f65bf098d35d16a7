//! HTTP API handlers for dactyl-capture

pub mod fingerprints;
pub mod health;
pub mod persons;

pub use fingerprints::fingerprint_routes;
pub use health::health_routes;
pub use persons::person_routes;
