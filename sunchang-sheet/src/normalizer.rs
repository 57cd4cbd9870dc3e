//! Map loosely-typed spreadsheet rows onto canonical `FinancialNode`s.
//!
//! Row shape (one JSON object per sheet row, unknown keys ignored):
//! id, type, status, dueDate, item, vendor, amount, projectCode
//!
//! Normalization is total: every row yields exactly one node. Missing or
//! malformed cells fall back to defaults and are reported as
//! [`Degradation`]s instead of failing the row.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashSet;
use sunchang_core::{
    DateSource, FinancialNode, RawDate, TransactionType, UNNAMED_ITEM, UNSPECIFIED_PARTY,
    reconcile_due_date,
};
use tracing::debug;

use crate::rules::{RowText, classify_category, classify_status, classify_type};

/// A cell that was absent or malformed and got a default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    MissingId,
    UnparseableAmount,
    NegativeAmount,
    MissingDueDate,
    UnparsedDueDate,
    /// Serialized date differed from the firm-local date and was converted
    ShiftedTimestamp,
    MissingItem,
    MissingVendor,
}

/// Inputs a single row cannot supply itself
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Firm-local "today": overdue cut-off and default due date
    pub today: NaiveDate,
    /// Id used when the row has none
    pub fallback_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub node: FinancialNode,
    pub degradations: Vec<Degradation>,
}

/// Read-only view over one raw row. Non-object rows behave as empty.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> RawRow<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.and_then(|m| m.get(key))
    }

    /// Cell as text; empty, null, `false` and `0` count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => {
                let f = n.as_f64()?;
                if f == 0.0 {
                    None
                } else if let Some(i) = n.as_i64() {
                    Some(i.to_string())
                } else if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// Due-date cell; a numeric `0` counts as absent, like in [`RawRow::text`].
    fn raw_date(&self, key: &str) -> RawDate<'a> {
        match self.get(key) {
            Some(Value::String(s)) => RawDate::Text(s),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => RawDate::Absent,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(ms) => RawDate::EpochMillis(ms),
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| RawDate::EpochMillis(f as i64))
                    .unwrap_or(RawDate::Absent),
            },
            _ => RawDate::Absent,
        }
    }
}

/// Normalize one row. Never fails.
pub fn normalize_row(row: &Value, ctx: &NormalizeContext) -> Normalized {
    let raw = RawRow::new(row);
    let mut degradations = Vec::new();

    let type_text = raw.text("type").unwrap_or_default();
    let status_text = raw.text("status").unwrap_or_default();
    let item = raw.text("item");
    let vendor = raw.text("vendor");
    let project_code = raw.text("projectCode");

    let text = RowText::new(
        &type_text,
        &status_text,
        item.as_deref().unwrap_or_default(),
        vendor.as_deref().unwrap_or_default(),
    );

    // 1. Receivable or payable
    let node_type = classify_type(&text);

    // 2. Due date, then status (the overdue check needs the date)
    let reconciled = reconcile_due_date(raw.raw_date("dueDate"), ctx.today);
    match reconciled.source {
        DateSource::Missing => degradations.push(Degradation::MissingDueDate),
        DateSource::Unparsed => degradations.push(Degradation::UnparsedDueDate),
        DateSource::Shifted => degradations.push(Degradation::ShiftedTimestamp),
        _ => {}
    }
    let past_due = reconciled.due_date.is_before(ctx.today);
    let status = classify_status(&text, past_due);

    // 3. Category, payables only
    let category = match node_type {
        TransactionType::Expense => Some(classify_category(&text)),
        TransactionType::Income => None,
    };

    // 4. Display fields
    if item.is_none() {
        degradations.push(Degradation::MissingItem);
    }
    let description = match (&project_code, &item) {
        (Some(code), Some(item)) => format!("[{code}] {item}"),
        (Some(code), None) => format!("[{code}] {UNNAMED_ITEM}"),
        (None, Some(item)) => item.clone(),
        (None, None) => UNNAMED_ITEM.to_string(),
    };

    let related_party = vendor.unwrap_or_else(|| {
        degradations.push(Degradation::MissingVendor);
        UNSPECIFIED_PARTY.to_string()
    });

    let id = raw.text("id").unwrap_or_else(|| {
        degradations.push(Degradation::MissingId);
        ctx.fallback_id.clone()
    });

    let amount = coerce_amount(raw.get("amount"), &mut degradations);

    Normalized {
        node: FinancialNode {
            id,
            description,
            amount,
            due_date: reconciled.due_date,
            node_type,
            category,
            status,
            related_party,
            notes: project_code,
        },
        degradations,
    }
}

/// Numeric cell or text like "850,000" / "NT$ 1,250,000" / "12000元".
/// Negative values are taken as magnitudes; anything else unreadable is 0.
fn coerce_amount(value: Option<&Value>, degradations: &mut Vec<Degradation>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_amount_text(s),
        _ => None,
    };

    match parsed.filter(|f| f.is_finite()) {
        Some(f) if f < 0.0 => {
            degradations.push(Degradation::NegativeAmount);
            -f
        }
        Some(f) => f,
        None => {
            degradations.push(Degradation::UnparseableAmount);
            0.0
        }
    }
}

fn parse_amount_text(s: &str) -> Option<f64> {
    let upper = s.trim().to_uppercase();
    let stripped = upper
        .strip_prefix("NT$")
        .or_else(|| upper.strip_prefix("NTD"))
        .unwrap_or(&upper);
    let cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | '$' | '元' | ' ' | '\u{3000}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Summary of a collection run
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeReport {
    pub nodes: Vec<FinancialNode>,
    /// Rows that needed at least one default
    pub degraded_rows: usize,
}

/// Normalize a whole collection, one node per row, in row order.
///
/// Rows without an id get `row-NNNN` (1-based row number); a repeated id gets
/// a `-2`, `-3`, … suffix so ids stay unique within the collection.
pub fn normalize_rows(rows: &[Value], today: NaiveDate) -> NormalizeReport {
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut nodes = Vec::with_capacity(rows.len());
    let mut degraded_rows = 0;

    for (i, row) in rows.iter().enumerate() {
        let ctx = NormalizeContext {
            today,
            fallback_id: format!("row-{:04}", i + 1),
        };
        let Normalized {
            mut node,
            degradations,
        } = normalize_row(row, &ctx);

        node.id = unique_id(node.id, &mut seen);

        if !degradations.is_empty() {
            degraded_rows += 1;
            debug!(row = i + 1, id = %node.id, ?degradations, "row normalized with defaults");
        }
        nodes.push(node);
    }

    NormalizeReport {
        nodes,
        degraded_rows,
    }
}

fn unique_id(base: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use sunchang_core::{DueDate, ExpenseCategory, NodeStatus};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, 21).unwrap()
    }

    fn ctx() -> NormalizeContext {
        NormalizeContext {
            today: today(),
            fallback_id: "row-0001".to_string(),
        }
    }

    fn norm(row: Value) -> Normalized {
        normalize_row(&row, &ctx())
    }

    #[test]
    fn test_receivable_shifted_timestamp_is_overdue() {
        let yesterday = today() - Duration::days(1);
        // Local midnight of `yesterday` serialized as 16:00 UTC the day before
        let raw = format!("{}T16:00:00.000Z", (yesterday - Duration::days(1)).format("%Y-%m-%d"));
        let out = norm(json!({
            "type": "應收", "status": "", "dueDate": raw,
            "amount": "850000", "item": "CD", "vendor": "Urban Living"
        }));
        assert_eq!(out.node.node_type, TransactionType::Income);
        assert_eq!(out.node.status, NodeStatus::Overdue);
        assert_eq!(out.node.amount, 850_000.0);
        assert_eq!(out.node.due_date, DueDate::Calendar(yesterday));
        assert_eq!(out.node.category, None);
        assert!(out.degradations.contains(&Degradation::ShiftedTimestamp));
    }

    #[test]
    fn test_paid_software_licence_is_fixed() {
        let out = norm(json!({
            "type": "支出", "status": "已付訖", "item": "軟體授權費",
            "vendor": "軟體經銷商", "amount": 50000
        }));
        assert_eq!(out.node.node_type, TransactionType::Expense);
        assert_eq!(out.node.category, Some(ExpenseCategory::Fixed));
        assert_eq!(out.node.status, NodeStatus::Paid);
        assert_eq!(out.node.amount, 50_000.0);
    }

    #[test]
    fn test_missing_due_date_is_today_and_not_overdue() {
        let out = norm(json!({ "type": "支出", "item": "結構審查費", "vendor": "穩固結構", "amount": 1 }));
        assert_eq!(out.node.due_date, DueDate::Calendar(today()));
        assert_eq!(out.node.status, NodeStatus::Pending);
        assert_eq!(out.degradations, vec![Degradation::MissingDueDate, Degradation::MissingId]);
    }

    #[test]
    fn test_same_day_is_pending_yesterday_overdue() {
        let due_today = norm(json!({ "status": "", "dueDate": "2023-11-21" }));
        assert_eq!(due_today.node.status, NodeStatus::Pending);
        let due_yesterday = norm(json!({ "status": "", "dueDate": "2023-11-20" }));
        assert_eq!(due_yesterday.node.status, NodeStatus::Overdue);
    }

    #[test]
    fn test_done_status_beats_future_and_past_dates() {
        for due in ["2020-01-01", "2030-01-01"] {
            let out = norm(json!({ "type": "應收帳款", "status": "完成", "dueDate": due }));
            assert_eq!(out.node.status, NodeStatus::Paid, "{due}");
        }
    }

    #[test]
    fn test_internal_staff_vendor_forces_payroll() {
        let out = norm(json!({ "type": "固定支出", "item": "辦公室租金", "vendor": "內部員工" }));
        assert_eq!(out.node.category, Some(ExpenseCategory::Payroll));
    }

    #[test]
    fn test_project_code_prefixes_description() {
        let out = norm(json!({ "id": 7, "item": "施工圖繪製 (CD)", "projectCode": "P-2311" }));
        assert_eq!(out.node.id, "7");
        assert_eq!(out.node.description, "[P-2311] 施工圖繪製 (CD)");
        assert_eq!(out.node.notes.as_deref(), Some("P-2311"));

        let no_item = norm(json!({ "projectCode": "P-9" }));
        assert_eq!(no_item.node.description, "[P-9] 未命名項目");
    }

    #[test]
    fn test_empty_row_degrades_to_defaults() {
        let out = norm(json!({}));
        assert_eq!(out.node.id, "row-0001");
        assert_eq!(out.node.description, UNNAMED_ITEM);
        assert_eq!(out.node.related_party, UNSPECIFIED_PARTY);
        assert_eq!(out.node.amount, 0.0);
        assert_eq!(out.node.node_type, TransactionType::Expense);
        assert_eq!(out.node.category, Some(ExpenseCategory::Subcontract));
        assert_eq!(out.node.notes, None);
    }

    #[test]
    fn test_non_object_row_still_yields_a_node() {
        let out = norm(json!("garbage"));
        assert_eq!(out.node.id, "row-0001");
        assert!(out.degradations.contains(&Degradation::UnparseableAmount));
    }

    #[test]
    fn test_amount_coercion() {
        let amount = |v: Value| norm(json!({ "amount": v })).node.amount;
        assert_eq!(amount(json!("1,250,000")), 1_250_000.0);
        assert_eq!(amount(json!("NT$ 450,000")), 450_000.0);
        assert_eq!(amount(json!("12000元")), 12_000.0);
        assert_eq!(amount(json!(1500.5)), 1500.5);
        assert_eq!(amount(json!("abc")), 0.0);
        assert_eq!(amount(json!("inf")), 0.0);
        assert_eq!(amount(json!(null)), 0.0);

        let neg = norm(json!({ "amount": -300 }));
        assert_eq!(neg.node.amount, 300.0);
        assert!(neg.degradations.contains(&Degradation::NegativeAmount));
    }

    #[test]
    fn test_epoch_millis_due_date() {
        let out = norm(json!({ "dueDate": 1_700_409_600_000i64 }));
        assert_eq!(
            out.node.due_date,
            DueDate::Calendar(NaiveDate::from_ymd_opt(2023, 11, 20).unwrap())
        );
    }

    #[test]
    fn test_zero_due_date_is_missing() {
        for zero in [json!(0), json!(0.0)] {
            let out = norm(json!({ "status": "", "dueDate": zero }));
            assert_eq!(out.node.due_date, DueDate::Calendar(today()));
            assert_eq!(out.node.status, NodeStatus::Pending);
            assert!(out.degradations.contains(&Degradation::MissingDueDate));
        }
    }

    #[test]
    fn test_unparsed_due_date_kept_and_not_overdue() {
        let out = norm(json!({ "status": "", "dueDate": "月底" }));
        assert_eq!(out.node.due_date, DueDate::Unparsed("月底".to_string()));
        assert_eq!(out.node.status, NodeStatus::Pending);
    }

    #[test]
    fn test_normalize_rows_is_total_and_ids_unique() {
        let rows = vec![
            json!({ "id": "7", "type": "應收" }),
            json!({ "id": "7", "type": "支出" }),
            json!({}),
            json!(42),
            json!({ "id": "row-0003" }),
        ];
        let report = normalize_rows(&rows, today());
        assert_eq!(report.nodes.len(), rows.len());

        let ids: Vec<_> = report.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["7", "7-2", "row-0003", "row-0004", "row-0003-2"]);
        assert_eq!(report.degraded_rows, 5);
    }

    #[test]
    fn test_category_iff_expense() {
        let rows: Vec<Value> = ["應收", "收入", "支出", "薪資", "", "INCOME", "固定"]
            .iter()
            .map(|t| json!({ "type": t }))
            .collect();
        for node in normalize_rows(&rows, today()).nodes {
            assert_eq!(node.category.is_some(), node.is_expense(), "{:?}", node);
        }
    }
}
