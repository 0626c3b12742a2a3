use proptest::prelude::*;

/// One operator action in a random timer script
#[derive(Debug, Clone, Copy)]
pub enum TimerAction {
    Start { operator: usize, operation: usize },
    Pause { operator: usize },
    Resume { operator: usize },
    Stop { operator: usize, operation: usize },
    Wait { minutes: i64 },
}

pub const OPERATORS: usize = 3;
pub const OPERATIONS: usize = 4;

pub fn timer_action_strategy() -> impl Strategy<Value = TimerAction> {
    prop_oneof![
        3 => (0..OPERATORS, 0..OPERATIONS)
            .prop_map(|(operator, operation)| TimerAction::Start { operator, operation }),
        1 => (0..OPERATORS).prop_map(|operator| TimerAction::Pause { operator }),
        1 => (0..OPERATORS).prop_map(|operator| TimerAction::Resume { operator }),
        2 => (0..OPERATORS, 0..OPERATIONS)
            .prop_map(|(operator, operation)| TimerAction::Stop { operator, operation }),
        1 => (1i64..90).prop_map(|minutes| TimerAction::Wait { minutes }),
    ]
}

pub fn timer_script_strategy() -> impl Strategy<Value = Vec<TimerAction>> {
    prop::collection::vec(timer_action_strategy(), 1..40)
}

/// Pause windows as (offset from start, length) in minutes, non-overlapping
pub fn pause_windows_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1i64..30, 1i64..20), 0..6)
}
