//! Type-safe wrappers around [`ResourceClient`](resource_framework::ResourceClient).

pub mod post_client;
pub mod user_client;

pub use post_client::*;
pub use user_client::*;
