// === PUBLIC CONTRACT ===
// Plain models shared with other crates (server binary, tests)
pub mod contract;

pub use contract::model;

// === ERROR CATALOG ===
// Machine-readable codes for every domain error
pub mod errors;

// === INTERNAL MODULES ===
// Exposed so the server binary can wire storage and routes, and for testing.
pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
