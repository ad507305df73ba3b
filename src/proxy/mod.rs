//! Proxy Module
//!
//! Destination resolution and upstream forwarding for cache misses.

mod forward;
mod resolver;

pub use forward::{Forwarder, HttpForwarder};
pub use resolver::{
    extract_path_info, Destination, DestinationResolver, MultipleDestinationResolver,
    SingleDestinationResolver,
};
