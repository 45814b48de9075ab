//! Budgets, their expense lines and the transactions assigned to them.

mod assignment;
mod core;
mod endpoints;
mod expense;

pub use assignment::{
    assign_transaction, get_budget_transactions, unassign_if_outside_budget, unassign_transaction,
};
pub use core::{
    Budget, BudgetRequest, create_budget, create_budget_table, delete_budget, get_budget,
    get_budgets, update_budget,
};
pub use endpoints::{
    BudgetState, assign_transaction_endpoint, create_budget_endpoint,
    create_budget_expense_endpoint, delete_budget_endpoint, delete_budget_expense_endpoint,
    get_budget_endpoint, list_budget_transactions_endpoint, list_budgets_endpoint,
    unassign_transaction_endpoint, update_budget_endpoint, update_budget_expense_endpoint,
};
pub use expense::{
    BudgetExpense, BudgetExpenseRequest, create_budget_expense, create_budget_expense_table,
    delete_budget_expense, update_budget_expense,
};
