//! Ordered keyword rule tables mapping free-text sheet cells to node
//! type, status and expense category.
//!
//! The sheet is maintained by hand, so these cells carry loose Traditional
//! Chinese (occasionally English) wording rather than enum values. Each table
//! is evaluated top to bottom and the first rule with a matching keyword
//! wins. Matching is a case-insensitive substring test; no rule combines
//! with another.

use sunchang_core::{ExpenseCategory, NodeStatus, TransactionType};

/// Which cell of the row a clause inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Type,
    Status,
    Item,
    Vendor,
}

/// Lower-cased, trimmed text cells of one row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowText {
    pub type_text: String,
    pub status: String,
    pub item: String,
    pub vendor: String,
}

impl RowText {
    pub fn new(type_text: &str, status: &str, item: &str, vendor: &str) -> Self {
        let norm = |s: &str| s.trim().to_lowercase();
        Self {
            type_text: norm(type_text),
            status: norm(status),
            item: norm(item),
            vendor: norm(vendor),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Type => &self.type_text,
            Field::Status => &self.status,
            Field::Item => &self.item,
            Field::Vendor => &self.vendor,
        }
    }
}

/// `field` contains any of `keywords` (stored lower-case)
#[derive(Debug, Clone, Copy)]
pub struct Clause {
    pub field: Field,
    pub keywords: &'static [&'static str],
}

impl Clause {
    pub fn matches(&self, row: &RowText) -> bool {
        let text = row.get(self.field);
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// Fires when any of its clauses matches
#[derive(Debug, Clone, Copy)]
pub struct Rule<T> {
    pub name: &'static str,
    pub clauses: &'static [Clause],
    pub outcome: T,
}

impl<T: Copy> Rule<T> {
    pub fn matches(&self, row: &RowText) -> bool {
        self.clauses.iter().any(|c| c.matches(row))
    }
}

/// Outcome of the first matching rule, if any
pub fn first_match<T: Copy>(rules: &[Rule<T>], row: &RowText) -> Option<T> {
    rules.iter().find(|r| r.matches(row)).map(|r| r.outcome)
}

// --- Type -------------------------------------------------------------------

/// "應收帳款", "收入", "INCOME" → receivable. Anything else is a payable.
pub static TYPE_RULES: &[Rule<TransactionType>] = &[Rule {
    name: "income",
    clauses: &[Clause {
        field: Field::Type,
        keywords: &["收", "income"],
    }],
    outcome: TransactionType::Income,
}];

pub fn classify_type(row: &RowText) -> TransactionType {
    first_match(TYPE_RULES, row).unwrap_or(TransactionType::Expense)
}

// --- Status -----------------------------------------------------------------

/// What the status text says, before the due date is considered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusHint {
    Settled,
    Cancelled,
    Awaiting,
}

pub static STATUS_RULES: &[Rule<StatusHint>] = &[
    Rule {
        name: "settled",
        clauses: &[Clause {
            field: Field::Status,
            keywords: &["已", "完成", "付訖", "收訖", "ok"],
        }],
        outcome: StatusHint::Settled,
    },
    Rule {
        name: "cancelled",
        clauses: &[Clause {
            field: Field::Status,
            keywords: &["取消", "作廢"],
        }],
        outcome: StatusHint::Cancelled,
    },
    Rule {
        name: "awaiting",
        clauses: &[Clause {
            field: Field::Status,
            keywords: &["待", "pending"],
        }],
        outcome: StatusHint::Awaiting,
    },
];

/// Status text hint; an empty cell counts as awaiting payment.
pub fn status_hint(row: &RowText) -> Option<StatusHint> {
    first_match(STATUS_RULES, row).or_else(|| row.status.is_empty().then_some(StatusHint::Awaiting))
}

/// Settled and cancelled nodes are both PAID so they drop out of alerting.
/// Only an awaiting node whose due date is strictly past is OVERDUE.
pub fn classify_status(row: &RowText, past_due: bool) -> NodeStatus {
    match status_hint(row) {
        Some(StatusHint::Settled) | Some(StatusHint::Cancelled) => NodeStatus::Paid,
        Some(StatusHint::Awaiting) if past_due => NodeStatus::Overdue,
        _ => NodeStatus::Pending,
    }
}

// --- Expense category -------------------------------------------------------

pub static CATEGORY_RULES: &[Rule<ExpenseCategory>] = &[
    Rule {
        name: "payroll",
        clauses: &[
            Clause {
                field: Field::Type,
                keywords: &["薪", "payroll", "salary"],
            },
            Clause {
                field: Field::Item,
                keywords: &["薪", "payroll", "salary"],
            },
            Clause {
                field: Field::Vendor,
                keywords: &["員工"],
            },
        ],
        outcome: ExpenseCategory::Payroll,
    },
    Rule {
        name: "fixed",
        clauses: &[
            Clause {
                field: Field::Type,
                keywords: &["固定", "fixed"],
            },
            Clause {
                field: Field::Item,
                keywords: &[
                    "租", "水電", "軟體", "授權費", "規費", "稅", "rent", "utilit", "software",
                    "license",
                ],
            },
        ],
        outcome: ExpenseCategory::Fixed,
    },
];

/// Outsourced consultants (structural, MEP, certification) are the bulk of
/// the firm's payables, so unmatched expenses land in SUBCONTRACT.
pub fn classify_category(row: &RowText) -> ExpenseCategory {
    first_match(CATEGORY_RULES, row).unwrap_or(ExpenseCategory::Subcontract)
}
