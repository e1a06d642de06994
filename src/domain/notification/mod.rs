//! Notification data model.
//!
//! - `types`: categories, roles, priority and the broadcast payload
//! - `result`: aggregate dispatch outcome and structured failure entries

mod result;
mod types;

pub use result::{DeliveryError, DeliveryErrorKind, DispatchResult};
pub use types::{DispatchMessage, NotificationCategory, Priority, RecipientRole};
