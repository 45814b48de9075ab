//! Monthly and yearly summaries of a user's transactions.

mod aggregation;
mod endpoints;

pub use aggregation::{
    MonthInfo, drop_empty, month_info, per_category, year_info, yearly_average_per_category,
};
pub use endpoints::{
    get_month_summary, get_month_types_summary, get_year_summary, get_year_types_summary,
};
