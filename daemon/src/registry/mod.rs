//! Deployment registry

pub mod model;
pub mod store;
