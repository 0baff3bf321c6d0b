//! Storybook document service library.
//!
//! Exposes config, state, error handling, storage and routes so that the
//! binary entrypoint and integration tests build the same application.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
