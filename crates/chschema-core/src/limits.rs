//! Fixed safety ceilings.
//!
//! Callers cannot raise these; exceeding any of them aborts the call with
//! [`Error::DepthExceeded`](crate::Error::DepthExceeded) or
//! [`Error::LimitExceeded`](crate::Error::LimitExceeded).

use crate::error::{Error, Result};

/// Maximum accepted DDL input, in bytes
pub const MAX_INPUT_LENGTH: usize = 10 * 1024 * 1024;

/// Maximum number of statements after splitting
pub const MAX_STATEMENTS: usize = 10_000;

/// Maximum length of a single statement, in bytes
pub const MAX_STATEMENT_LENGTH: usize = 1024 * 1024;

/// Maximum number of tables handed to or produced by one call
pub const MAX_TABLES: usize = 5_000;

/// Maximum columns per table
pub const MAX_COLUMNS: usize = 2_000;

/// Maximum type nesting depth; a bare leaf type has depth 1
pub const MAX_TYPE_DEPTH: usize = 20;

/// Maximum members of a single enumeration
pub const MAX_ENUM_MEMBERS: usize = 1_024;

/// Maximum elements of a single tuple
pub const MAX_TUPLE_ARITY: usize = 256;

/// Maximum iterations of any single parser loop
pub const MAX_LOOP_STEPS: usize = 100_000;

/// Fails with `LimitExceeded` when `value` is above `limit`
pub(crate) fn ensure_within(what: &'static str, value: usize, limit: usize) -> Result<()> {
    if value > limit {
        Err(Error::LimitExceeded { what, limit })
    } else {
        Ok(())
    }
}

/// Fails with `DepthExceeded` when `depth` is above [`MAX_TYPE_DEPTH`]
pub(crate) fn ensure_type_depth(depth: usize) -> Result<()> {
    if depth > MAX_TYPE_DEPTH {
        Err(Error::DepthExceeded {
            what: "type",
            limit: MAX_TYPE_DEPTH,
        })
    } else {
        Ok(())
    }
}

/// Iteration counter for parser loops
#[derive(Debug)]
pub(crate) struct StepBudget {
    what: &'static str,
    steps: usize,
}

impl StepBudget {
    pub(crate) fn new(what: &'static str) -> Self {
        Self { what, steps: 0 }
    }

    pub(crate) fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        ensure_within(self.what, self.steps, MAX_LOOP_STEPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_budget_trips_after_ceiling() {
        let mut budget = StepBudget::new("balanced skip");
        for _ in 0..MAX_LOOP_STEPS {
            budget.tick().unwrap();
        }
        assert_eq!(
            budget.tick(),
            Err(Error::LimitExceeded {
                what: "balanced skip",
                limit: MAX_LOOP_STEPS
            })
        );
    }

    #[test]
    fn test_type_depth_boundary() {
        assert!(ensure_type_depth(MAX_TYPE_DEPTH).is_ok());
        assert!(matches!(
            ensure_type_depth(MAX_TYPE_DEPTH + 1),
            Err(Error::DepthExceeded { .. })
        ));
    }
}
