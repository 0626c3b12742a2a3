use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A manufacturing stage. Lower `sequence` means an earlier stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Cell {
    pub id: Uuid,
    pub name: String,
    pub sequence: i32,
}

impl Cell {
    pub fn new(name: impl Into<String>, sequence: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sequence,
        }
    }
}
