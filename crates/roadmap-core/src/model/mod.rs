//! Work-item hierarchy data model.

pub mod item;
pub mod node;
pub mod portfolio;

pub use item::{ItemFields, ItemType, ParseEnumError, Priority, Status};
pub use node::{BusinessRequest, Epic, Feature, Node, RequestChild, Story, WorkItem};
pub use portfolio::{Initiative, Portfolio, Theme};
