//! Cell-priority rule: the current cell is the cell with the lowest sequence
//! among operations that are in progress. Ties go to the lowest operation id.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::Operation;

/// Cell id to cell sequence
pub type CellSequences = HashMap<Uuid, i32>;

/// Cell of the earliest-stage in-progress operation, if any.
///
/// Operations whose cell is missing from `sequences` sort after every known cell.
pub fn frontier_cell<'a, I>(operations: I, sequences: &CellSequences) -> Option<Uuid>
where
    I: IntoIterator<Item = &'a Operation>,
{
    operations
        .into_iter()
        .filter(|operation| operation.status.is_active())
        .min_by_key(|operation| {
            let sequence = sequences.get(&operation.cell_id).copied().unwrap_or(i32::MAX);
            (sequence, operation.id)
        })
        .map(|operation| operation.cell_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::OperationStatus;

    fn op(cell_id: Uuid, status: OperationStatus) -> Operation {
        Operation::new(Uuid::new_v4(), cell_id, "op", 1).with_status(status)
    }

    #[test]
    fn test_lowest_sequence_wins() {
        let (early, late) = (Uuid::new_v4(), Uuid::new_v4());
        let sequences = CellSequences::from([(early, 10), (late, 30)]);
        let ops = vec![
            op(late, OperationStatus::InProgress),
            op(early, OperationStatus::InProgress),
        ];
        assert_eq!(frontier_cell(&ops, &sequences), Some(early));
    }

    #[test]
    fn test_only_in_progress_operations_count() {
        let (early, late) = (Uuid::new_v4(), Uuid::new_v4());
        let sequences = CellSequences::from([(early, 10), (late, 30)]);
        let ops = vec![
            op(early, OperationStatus::OnHold),
            op(early, OperationStatus::Completed),
            op(early, OperationStatus::NotStarted),
            op(late, OperationStatus::InProgress),
        ];
        assert_eq!(frontier_cell(&ops, &sequences), Some(late));
    }

    #[test]
    fn test_no_active_work_yields_none() {
        let ops = vec![op(Uuid::new_v4(), OperationStatus::NotStarted)];
        assert_eq!(frontier_cell(&ops, &CellSequences::new()), None);
    }

    #[test]
    fn test_tie_is_deterministic() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let sequences = CellSequences::from([(a, 20), (b, 20)]);
        let ops = vec![
            op(a, OperationStatus::InProgress),
            op(b, OperationStatus::InProgress),
        ];
        let mut reversed = ops.clone();
        reversed.reverse();

        let expected = ops.iter().min_by_key(|o| o.id).map(|o| o.cell_id);
        assert_eq!(frontier_cell(&ops, &sequences), expected);
        assert_eq!(frontier_cell(&reversed, &sequences), expected);
    }

    #[test]
    fn test_unknown_cells_sort_last() {
        let (known, unknown) = (Uuid::new_v4(), Uuid::new_v4());
        let sequences = CellSequences::from([(known, 500)]);
        let ops = vec![
            op(unknown, OperationStatus::InProgress),
            op(known, OperationStatus::InProgress),
        ];
        assert_eq!(frontier_cell(&ops, &sequences), Some(known));
    }
}
