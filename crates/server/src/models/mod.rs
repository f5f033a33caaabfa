//! Domain models returned by repositories and serialized by handlers.

pub mod banner;
pub mod catalog;
pub mod delivery;
pub mod order;
pub mod pagination;
pub mod payment;
pub mod session;
pub mod user;

pub use banner::HeroBanner;
pub use catalog::{Breadcrumb, Category, CategoryDetail, CategoryNode, Product};
pub use delivery::{DeliveryRoute, DeliveryStop};
pub use order::{Order, OrderDetail, OrderItem, StatusLogEntry};
pub use pagination::{PageError, PageParams};
pub use payment::Payment;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
