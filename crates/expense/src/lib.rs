//! `claimflow-expense` — the expense claim aggregate and its lifecycle.
//!
//! State transitions are driven by one explicit table in [`state`]; the
//! aggregate itself is mutated only through pure snapshot-to-snapshot
//! functions, which keeps audit diffing trivial and the whole lifecycle
//! testable without a live store.

pub mod expense;
pub mod line_item;
pub mod state;

pub use expense::{CreateExpense, EditExpense, Expense};
pub use line_item::LineItem;
pub use state::{ExpenseAction, ExpenseState, StateMachine, TransitionError};
