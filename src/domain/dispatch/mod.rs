//! Public dispatch entry points.
//!
//! - `send_now`: resolve, deliver, return the aggregate result
//! - `queue_for_later`: resolve, store a pending job, return its id
//! - `helpers`: category-specific requests with fixed copy

mod dispatcher;
mod error;
pub mod helpers;
mod request;

pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, NotificationDispatcher, QueueReceipt};
pub use error::DispatchError;
pub use helpers::AttendanceStatus;
pub use request::{MessageDefaults, PushRequest, PushRequestBuilder};
