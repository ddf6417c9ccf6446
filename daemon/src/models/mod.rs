//! Wire models

pub mod event;

pub use event::{PushEvent, PushRepository};
