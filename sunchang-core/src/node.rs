//! Canonical receivable/payable node and its enumerated fields

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Description used when a row carries neither an item nor a project code.
pub const UNNAMED_ITEM: &str = "未命名項目";

/// Counterparty used when a row has no vendor/client.
pub const UNSPECIFIED_PARTY: &str = "未指定對象";

/// Receivable (INCOME) or payable (EXPENSE)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

/// Expense buckets. Only EXPENSE nodes carry one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Payroll,
    Fixed,
    Subcontract,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 3] = [
        ExpenseCategory::Payroll,
        ExpenseCategory::Subcontract,
        ExpenseCategory::Fixed,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ExpenseCategory::Payroll => "PAYROLL",
            ExpenseCategory::Fixed => "FIXED",
            ExpenseCategory::Subcontract => "SUBCONTRACT",
        }
    }

    /// Display label in the firm's locale (zh-TW)
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Payroll => "事務所薪資",
            ExpenseCategory::Fixed => "固定支出",
            ExpenseCategory::Subcontract => "複委託支付節點",
        }
    }
}

/// Payment status of a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Pending,
    Paid,
    Overdue,
}

impl NodeStatus {
    pub fn code(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "PENDING",
            NodeStatus::Paid => "PAID",
            NodeStatus::Overdue => "OVERDUE",
        }
    }

    /// Still owed (to or by the firm)
    pub fn is_open(&self) -> bool {
        *self != NodeStatus::Paid
    }

    /// zh-TW label; wording differs between the receivable and payable views.
    pub fn label(&self, node_type: TransactionType) -> &'static str {
        match (self, node_type) {
            (NodeStatus::Paid, TransactionType::Income) => "已入帳",
            (NodeStatus::Paid, TransactionType::Expense) => "已付款",
            (NodeStatus::Overdue, _) => "逾期",
            (NodeStatus::Pending, TransactionType::Income) => "待收款",
            (NodeStatus::Pending, TransactionType::Expense) => "待支付",
        }
    }
}

/// Due date as reconciled from the source.
///
/// `Unparsed` keeps the date-only prefix of a value that could not be read as
/// a date at all; such nodes are never considered overdue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DueDate {
    Calendar(NaiveDate),
    Unparsed(String),
}

impl DueDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DueDate::Calendar(d) => Some(*d),
            DueDate::Unparsed(_) => None,
        }
    }

    /// Strictly before `today`. Same-day is never past.
    pub fn is_before(&self, today: NaiveDate) -> bool {
        self.as_date().is_some_and(|d| d < today)
    }
}

impl From<NaiveDate> for DueDate {
    fn from(d: NaiveDate) -> Self {
        DueDate::Calendar(d)
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueDate::Calendar(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DueDate::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// One receivable or payable milestone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialNode {
    /// Unique within a loaded collection
    pub id: String,
    /// Project name or expense item
    pub description: String,
    /// Non-negative, in TWD
    pub amount: f64,
    pub due_date: DueDate,
    #[serde(rename = "type")]
    pub node_type: TransactionType,
    /// Set iff `node_type` is EXPENSE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ExpenseCategory>,
    pub status: NodeStatus,
    /// Client or sub-contractor name
    pub related_party: String,
    /// Project code, when the row had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FinancialNode {
    /// A PENDING receivable
    pub fn income(
        id: impl Into<String>,
        due_date: impl Into<DueDate>,
        description: impl Into<String>,
        amount: f64,
        related_party: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            due_date: due_date.into(),
            node_type: TransactionType::Income,
            category: None,
            status: NodeStatus::Pending,
            related_party: related_party.into(),
            notes: None,
        }
    }

    /// A PENDING payable in `category`
    pub fn expense(
        id: impl Into<String>,
        due_date: impl Into<DueDate>,
        description: impl Into<String>,
        amount: f64,
        category: ExpenseCategory,
        related_party: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            due_date: due_date.into(),
            node_type: TransactionType::Expense,
            category: Some(category),
            status: NodeStatus::Pending,
            related_party: related_party.into(),
            notes: None,
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_income(&self) -> bool {
        self.node_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.node_type == TransactionType::Expense
    }

    /// Not yet settled
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
