//! Core types for SchoolMall.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod slug;
pub mod status;

pub use category::{ancestry, would_create_cycle};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use order::{
    CartLine, OrderPlan, PlacementError, PlannedItem, ProductSnapshot, merge_lines,
    new_order_number, plan_order,
};
pub use slug::slugify;
pub use status::*;
