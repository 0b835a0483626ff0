//! Domain layer: firmware data model, signature catalog, extraction and
//! inventory services, and the overlap/ranking policies.

pub mod catalog;
pub mod domain;
pub mod policies;
pub mod services;
