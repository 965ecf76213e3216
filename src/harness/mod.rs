//! Runtime harness to execute modules and keep the process alive

mod heart;
mod module;

pub use heart::*;
pub use module::*;
