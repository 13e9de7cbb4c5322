//! Docscan - document scan processing server
//!
//! Unwarps and filters photographed documents as asynchronous jobs, and
//! delivers preference-gated push notifications and scheduled reminders.
//! This library exposes modules for integration testing.

pub mod api;
pub mod cli;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
