//! Default stat calculation - an ordered fold over a stat's modifiers

use super::Modifier;
use crate::operator::{Operator, OperatorTable};

/// Which modifiers take part in a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculateOptions {
    pub ignore_inactive: bool,
    pub ignore_hidden: bool,
}

impl Default for CalculateOptions {
    fn default() -> Self {
        CalculateOptions {
            ignore_inactive: true,
            ignore_hidden: false,
        }
    }
}

impl CalculateOptions {
    fn skips(&self, modifier: &Modifier) -> bool {
        (self.ignore_inactive && !modifier.is_active()) || (self.ignore_hidden && modifier.is_hidden)
    }
}

/// Fold `modifiers` into `base`, left to right
///
/// `modifiers` must already be sorted by operator order. A contiguous run of
/// `PercentAdd` entries is summed and applied once as `result * (1 + sum)`.
/// The fold stops at the first entry belonging to a different stat than the
/// first one.
pub fn calculate(
    base: f32,
    modifiers: &[Modifier],
    operators: &OperatorTable,
    options: CalculateOptions,
) -> f32 {
    let Some(first) = modifiers.first() else {
        return base;
    };
    let stat = &first.stat_type;

    let mut applied = modifiers
        .iter()
        .take_while(|m| &m.stat_type == stat)
        .filter(|m| !options.skips(m))
        .peekable();

    let mut result = base;
    let mut percent = 0.0;
    while let Some(modifier) = applied.next() {
        if modifier.op == Operator::PercentAdd {
            percent = operators.compute(&Operator::PercentAdd, percent, modifier.value);
            let run_continues = applied
                .peek()
                .is_some_and(|next| next.op == Operator::PercentAdd);
            if !run_continues {
                result *= 1.0 + percent;
                percent = 0.0;
            }
        } else {
            result = operators.compute(&modifier.op, result, modifier.value);
        }
    }
    result
}
