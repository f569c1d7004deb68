//! Core types shared across chromup.
//!
//! The only resident today is the error system: the [`UpdateError`] taxonomy
//! used by every pipeline component, and the [`ErrorContext`] wrapper that
//! turns any failure into a user-facing message with a suggestion.

pub mod error;

pub use error::{ErrorContext, UpdateError, user_friendly_error};
