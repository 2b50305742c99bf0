//! Model persistence
//!
//! The trained forest and its label encoder are written together as one
//! JSON artifact and read back as one unit.

mod artifact;

pub use artifact::ModelArtifact;
