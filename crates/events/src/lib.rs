//! Lifecycle notifications for the application bootstrapper
//!
//! This crate provides the event bus the bootstrapper announces startup and
//! root composition on, and the event types carried over it.

mod bus;
mod types;

pub use bus::{wait_for, EventBus, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use types::*;
