//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/users/{user_id}', use [format_endpoint].

/// The route for checking that the server is up.
pub const PING: &str = "/api/ping";
/// The route that starts logging in with an identity provider.
pub const AUTH_PROVIDER: &str = "/api/auth/{provider}";
/// The route identity providers redirect back to.
pub const AUTH_CALLBACK: &str = "/api/auth/callback/{provider}";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for the logged-in user's profile.
pub const CURRENT_USER: &str = "/api/users/me";

/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route listing transactions that are not assigned to a budget.
pub const UNASSIGNED_TRANSACTIONS: &str = "/api/transactions/unassigned";
/// The route listing the supported recurrence intervals.
pub const INTERVALS: &str = "/api/transactions/intervals";
/// The route listing the income transaction types.
pub const INCOME_TYPES: &str = "/api/transactions/types/income";
/// The route listing the expense transaction types.
pub const EXPENSE_TYPES: &str = "/api/transactions/types/expense";
/// The route to access a recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring/{rule_id}";

/// The route for the income and expenses of a month.
pub const MONTH_SUMMARY: &str = "/api/transactions/summary/month";
/// The route for the income and expenses of each month of a year.
pub const YEAR_SUMMARY: &str = "/api/transactions/summary/year";
/// The route for a month's totals per transaction type.
pub const MONTH_TYPES_SUMMARY: &str = "/api/transactions/summary/month/types";
/// The route for a year's monthly average per transaction type.
pub const YEAR_TYPES_SUMMARY: &str = "/api/transactions/summary/year/types";

/// The route to access budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to create budget expenses.
pub const BUDGET_EXPENSES: &str = "/api/budgets/{budget_id}/expenses";
/// The route to access a single budget expense.
pub const BUDGET_EXPENSE: &str = "/api/budgets/{budget_id}/expenses/{expense_id}";
/// The route to access the transactions assigned to a budget.
pub const BUDGET_TRANSACTIONS: &str = "/api/budgets/{budget_id}/transactions";
/// The route to unassign a transaction from a budget.
pub const BUDGET_TRANSACTION: &str = "/api/budgets/{budget_id}/transactions/{transaction_id}";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Call it once per parameter for paths with several parameters.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    replace_parameter(endpoint_path, &id.to_string())
}

/// Replace the `{provider}` parameter in `endpoint_path` with the provider `name`.
pub fn format_provider_endpoint(endpoint_path: &str, name: &str) -> String {
    replace_parameter(endpoint_path, name)
}

fn replace_parameter(endpoint_path: &str, value: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::{format_endpoint, format_provider_endpoint};

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::PING);
        assert_endpoint_is_valid_uri(endpoints::AUTH_PROVIDER);
        assert_endpoint_is_valid_uri(endpoints::AUTH_CALLBACK);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::CURRENT_USER);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::UNASSIGNED_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::INTERVALS);
        assert_endpoint_is_valid_uri(endpoints::INCOME_TYPES);
        assert_endpoint_is_valid_uri(endpoints::EXPENSE_TYPES);
        assert_endpoint_is_valid_uri(endpoints::RECURRING_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::MONTH_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::YEAR_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::MONTH_TYPES_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::YEAR_TYPES_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::BUDGETS);
        assert_endpoint_is_valid_uri(endpoints::BUDGET);
        assert_endpoint_is_valid_uri(endpoints::BUDGET_EXPENSES);
        assert_endpoint_is_valid_uri(endpoints::BUDGET_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::BUDGET_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::BUDGET_TRANSACTION);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn two_parameters_are_replaced_in_order() {
        let formatted_path = format_endpoint(endpoints::BUDGET_EXPENSE, 4);
        let formatted_path = format_endpoint(&formatted_path, 9);

        assert_eq!(formatted_path, "/api/budgets/4/expenses/9");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn provider_name_is_substituted() {
        let formatted_path = format_provider_endpoint(endpoints::AUTH_CALLBACK, "demo");

        assert_eq!(formatted_path, "/api/auth/callback/demo");
    }
}
