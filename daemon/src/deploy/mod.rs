//! Deployment engine
//!
//! The reconciler drives git sync, image build, container replacement and
//! routing regeneration in strict sequence per event. The external tools sit
//! behind capability traits so the engine can be exercised against fakes.

pub mod container;
pub mod docker;
pub mod git;
pub mod image;
pub mod nginx;
pub mod process;
pub mod reconciler;
pub mod repo;
pub mod routing;
