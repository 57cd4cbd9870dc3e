//! sunchang-core: canonical receivable/payable nodes, firm-local dates and
//! dashboard aggregates

pub mod aggregate;
pub mod money;
pub mod node;
pub mod time;

pub use aggregate::{
    CashFlowPoint, DashboardStats, category_subtotals, dashboard_stats, monthly_cash_flow,
    overdue_count, payables, receivables, total_payables, total_receivables, upcoming_payments,
};
pub use money::{format_twd, group_thousands};
pub use node::{
    DueDate, ExpenseCategory, FinancialNode, NodeStatus, TransactionType, UNNAMED_ITEM,
    UNSPECIFIED_PARTY,
};
pub use time::{
    DateSource, FIRM_TIMEZONE, RawDate, Reconciled, firm_date, reconcile_due_date,
    today_in_firm_tz,
};
