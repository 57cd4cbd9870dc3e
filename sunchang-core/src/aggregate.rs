//! Dashboard aggregates: totals, per-category subtotals and the cash-flow
//! series. All pure reductions over a loaded collection.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::node::{ExpenseCategory, FinancialNode};

/// Headline figures for the overview page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_receivables: f64,
    pub total_payables: f64,
    pub net_cash_flow: f64,
    pub overdue_count: usize,
}

/// One month of the projected cash flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashFlowPoint {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    /// Running balance including this month
    pub balance: f64,
}

/// Open (non-PAID) INCOME total
pub fn total_receivables(nodes: &[FinancialNode]) -> f64 {
    nodes
        .iter()
        .filter(|n| n.is_income() && n.is_open())
        .map(|n| n.amount)
        .sum()
}

/// Open (non-PAID) EXPENSE total
pub fn total_payables(nodes: &[FinancialNode]) -> f64 {
    nodes
        .iter()
        .filter(|n| n.is_expense() && n.is_open())
        .map(|n| n.amount)
        .sum()
}

pub fn overdue_count(nodes: &[FinancialNode]) -> usize {
    nodes
        .iter()
        .filter(|n| n.status == crate::node::NodeStatus::Overdue)
        .count()
}

pub fn dashboard_stats(nodes: &[FinancialNode]) -> DashboardStats {
    let total_receivables = total_receivables(nodes);
    let total_payables = total_payables(nodes);
    DashboardStats {
        total_receivables,
        total_payables,
        net_cash_flow: total_receivables - total_payables,
        overdue_count: overdue_count(nodes),
    }
}

/// Expense sum per category, all statuses included (payables view summary).
/// Every category is present, zero when unused.
pub fn category_subtotals(nodes: &[FinancialNode]) -> BTreeMap<ExpenseCategory, f64> {
    let mut out: BTreeMap<ExpenseCategory, f64> =
        ExpenseCategory::ALL.iter().map(|c| (*c, 0.0)).collect();

    for n in nodes.iter().filter(|n| n.is_expense()) {
        if let Some(cat) = n.category {
            *out.entry(cat).or_insert(0.0) += n.amount;
        }
    }
    out
}

pub fn receivables(nodes: &[FinancialNode]) -> Vec<&FinancialNode> {
    nodes.iter().filter(|n| n.is_income()).collect()
}

pub fn payables(nodes: &[FinancialNode]) -> Vec<&FinancialNode> {
    nodes.iter().filter(|n| n.is_expense()).collect()
}

/// Month-by-month open income vs. expenses with a running balance.
///
/// Nodes without a parsed due date cannot be placed on the timeline and are
/// left out.
pub fn monthly_cash_flow(nodes: &[FinancialNode]) -> Vec<CashFlowPoint> {
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for n in nodes.iter().filter(|n| n.is_open()) {
        let Some(date) = n.due_date.as_date() else {
            continue;
        };
        let slot = months.entry(date.format("%Y-%m").to_string()).or_default();
        if n.is_income() {
            slot.0 += n.amount;
        } else {
            slot.1 += n.amount;
        }
    }

    let mut balance = 0.0;
    months
        .into_iter()
        .map(|(month, (income, expenses))| {
            balance += income - expenses;
            CashFlowPoint {
                month,
                income,
                expenses,
                balance,
            }
        })
        .collect()
}

/// Open payables due between `today` and `today + days` (inclusive), earliest first.
///
/// A window reaching past the last representable date has no upper bound.
pub fn upcoming_payments(nodes: &[FinancialNode], today: NaiveDate, days: i64) -> Vec<&FinancialNode> {
    let horizon = Duration::try_days(days).and_then(|span| today.checked_add_signed(span));
    let within = |d: NaiveDate| d >= today && horizon.is_none_or(|h| d <= h);
    let mut out: Vec<&FinancialNode> = nodes
        .iter()
        .filter(|n| n.is_expense() && n.is_open())
        .filter(|n| n.due_date.as_date().is_some_and(within))
        .collect();
    out.sort_by_key(|n| n.due_date.as_date());
    out
}
