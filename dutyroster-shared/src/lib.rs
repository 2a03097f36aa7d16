//! # Dutyroster Shared Library
//!
//! This crate contains the domain types, authorization engine, and storage
//! ports used by the Dutyroster API server.
//!
//! ## Module Organization
//!
//! - `hierarchy`: Four-level scope descriptors, containment, and set filters
//! - `auth`: Identity tokens, password hashing, and role/scope guards
//! - `lifecycle`: Task state machine (assigned → completed → verified)
//! - `models`: User and task records with their PostgreSQL queries
//! - `store`: Storage ports plus in-memory and PostgreSQL adapters
//! - `services`: Request-level orchestration over the store
//! - `db`: Connection pool and migrations
//! - `error`: Core error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod lifecycle;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Dutyroster shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
