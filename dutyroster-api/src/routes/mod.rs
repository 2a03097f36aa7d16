/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `users`: Profile lookups
/// - `tasks`: Task listing, creation, update and deletion

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
