//! TiffinBuddy storefront library.
//!
//! The customer storefront and the admin panel, served from one axum app
//! that renders pages server-side and talks to the remote food API. Built
//! as a library so the integration tests can drive the router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod location;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
