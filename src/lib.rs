//! Authentication/authorization gate for an edge service.
//!
//! Startup resolves a token verification key once (bundled `pubkey.txt`, else
//! the authorization server's key-uri) and builds an [`services::auth::AccessGate`].
//! Every request then goes through permit-all matching, bearer-token
//! verification and a delegated [`services::auth::PermissionEvaluator`] check.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
mod testutil;
