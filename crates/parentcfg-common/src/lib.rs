//! parentcfg Common - catalog types for parent-selection config generation
//!
//! This crate provides the immutable snapshot records the compiler reads:
//! - Delivery services and their origins
//! - Cache servers and the generating server descriptor
//! - Topologies and cache groups
//! - Parent candidates keyed by origin host
//! - Profile parameters turned into explicit structs
//! - Error handling
//!
//! Nothing in here is mutated during a compilation. Collaborators load the
//! records, the compiler only borrows them.

#![warn(clippy::all)]

pub mod capability;
pub mod delivery_service;
pub mod error;
pub mod params;
pub mod parent;
pub mod server;
pub mod topology;

pub use capability::CapabilitySet;
pub use delivery_service::*;
pub use error::*;
pub use params::*;
pub use parent::*;
pub use server::*;
pub use topology::*;
