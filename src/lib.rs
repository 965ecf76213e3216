//! This library crate contains everything needed to run an admission-gating reverse proxy.
//!
//! Requests arriving at the proxy are held back until either the backend announces fresh state
//! through a pub/sub notification or a bounded timeout elapses, whichever comes first.
//!
//! Submodules split responsibilities in a chain of dependencies from the low-level [`library`]
//! primitives, over the executable [`harness`], up to the runnable [`module`].

#![deny(missing_docs)]

pub mod constants;
pub mod harness;
pub mod library;
pub mod module;
