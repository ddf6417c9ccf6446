//! Slipway Library
//!
//! Core modules for the Slipway deployment daemon.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod installer;
pub mod logs;
pub mod models;
pub mod registry;
pub mod server;
pub mod storage;
pub mod utils;
