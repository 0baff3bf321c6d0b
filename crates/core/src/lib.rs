//! Storybook domain model.
//!
//! Scenes, the story document, the ordering and id rules that keep the
//! document consistent, and the validation applied to documents coming from
//! outside the process (imports, cache entries, save requests). Nothing in
//! this crate performs I/O.

pub mod document;
pub mod error;
pub mod media;
pub mod protocol;
pub mod transfer;
pub mod types;
pub mod validation;
