//! Vendor-neutral policy model.

pub mod names;
pub mod objects;
pub mod policy;
pub mod repository;

pub use names::{safe_comments, safe_name, ANY};
pub use objects::{CpObject, DayWindow, ObjectKind, Weekday};
pub use policy::{Action, Layer, NatMethod, NatRule, Package, Rule, Track};
pub use repository::Repository;
