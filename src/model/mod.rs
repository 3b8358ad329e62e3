//! Records, DTOs and views of the service's resources.

pub mod post;
pub mod user;

pub use post::*;
pub use user::*;
