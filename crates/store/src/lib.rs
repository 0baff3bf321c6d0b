//! Storybook state store.
//!
//! Holds the story document for a session, applies edits to it and mirrors
//! every change to a local cache and, for authoring sessions, to a remote
//! document service through a [`gateway::PersistenceGateway`].

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod remote;
pub mod store;
