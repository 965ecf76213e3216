//! Independent and project agnostic libraries
//!
//! Ideally, any of the library submodules in this module can be extracted into their own crate
//! at any given time. They have been developed with the gating proxy in mind, however, nothing
//! in them is bound to a specific backend or deployment.

pub mod gate;
pub mod helpers;
pub mod http;
pub mod notification;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
