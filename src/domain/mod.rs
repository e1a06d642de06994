//! Domain layer modules
//!
//! The dispatch engine:
//! - `notification`: categories, roles, messages and results
//! - `audience`: audience resolution and the user/token/preference stores
//! - `gateway`: push gateway abstraction and the Expo client
//! - `batch`: chunked delivery with per-token accounting
//! - `queue`: deferred job storage
//! - `dispatch`: public entry points and category helpers

pub mod audience;
pub mod batch;
pub mod dispatch;
pub mod gateway;
pub mod notification;
pub mod queue;
