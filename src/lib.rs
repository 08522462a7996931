//! Library exports for authkeeper, shared between the binary and tests.

pub mod auth;
pub mod config;
pub mod context;
pub mod keys;
pub mod models;
pub mod oauth;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
