pub mod error;
pub mod merge;
pub mod repo;
pub mod service;
