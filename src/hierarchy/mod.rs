//! # Assembly Hierarchy
//!
//! Parent/child links between parts and the queries gating assembly work.

pub mod assembly;

pub use assembly::{AssemblyHierarchy, AssemblyNode, DependencyStatus, IncompleteChild};
