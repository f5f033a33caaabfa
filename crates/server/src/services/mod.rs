//! Business logic that spans repositories or talks to the outside world.

pub mod auth;
pub mod email;
pub mod orders;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use orders::{OrderError, OrderService};
