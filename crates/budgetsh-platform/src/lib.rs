//! Budgeting service abstraction.
//!
//! Command handlers never talk to the remote server directly; they go
//! through the [`BudgetService`] trait. [`MemoryService`] keeps everything
//! in process and backs the offline shell and the tests.

mod memory;
mod services;

pub use memory::MemoryService;
pub use services::{
    Account, Budget, BudgetService, Category, Group, Id, NewTransaction, Payee, Role, Transaction,
    TransactionFilter, User,
};
