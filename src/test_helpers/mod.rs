// Test Helpers Module
//
// Deterministic clock, recording notifiers and an in-memory fixture shared by
// unit and integration tests.

pub mod doubles;
pub mod fixture;

pub use doubles::{FailingNotifier, ManualClock, RecordingNotifier};
pub use fixture::ProductionFixture;
