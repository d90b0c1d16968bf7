//! Infrastructure layer: persistence adapters and the action pipeline.

pub mod dispatcher;
pub mod in_memory;
pub mod repository;


pub use dispatcher::{ActionDispatcher, DispatchError, ExpenseCommand};
pub use in_memory::{InMemoryDirectory, InMemoryExpenseRepository};
pub use repository::{ExpenseRepository, RepositoryError};
