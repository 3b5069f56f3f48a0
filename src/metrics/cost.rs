//! Cost metrics, read off the latest monthly expense snapshot.

use crate::core::fund::ExpenseSnapshot;

pub fn expense_ratio(snapshot: Option<&ExpenseSnapshot>) -> Option<f64> {
    snapshot.map(|s| s.ter)
}
