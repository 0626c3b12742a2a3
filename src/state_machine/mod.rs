// Status types for jobs, parts and operations.
//
// Transitions are driven by the time-tracking lifecycle and the propagation
// engine; these types only describe the states and their predicates.

pub mod states;

pub use states::{JobStatus, OperationStatus, PartStatus};
