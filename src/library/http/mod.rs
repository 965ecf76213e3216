//! Structures for handling and forwarding HTTP requests

mod forward;

pub use forward::{forward_request, uri_with_authority, ForwardError};
