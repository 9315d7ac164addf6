pub mod ctx;
pub mod error;
pub mod repo;
pub mod service;
pub mod voting;
