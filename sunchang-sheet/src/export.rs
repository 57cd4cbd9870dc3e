//! CSV export of the receivable / payable views.
//!
//! UTF-8 with a byte-order mark so spreadsheet apps pick the right encoding
//! for the zh-TW headers. Column order is fixed per view.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use sunchang_core::FinancialNode;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportView {
    Receivables,
    Payables,
}

impl ExportView {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ExportView::Receivables => &[
                "ID",
                "到期日 (Due Date)",
                "項目描述 (Description)",
                "客戶/對象 (Client)",
                "金額 (Amount)",
                "狀態 (Status)",
            ],
            ExportView::Payables => &[
                "ID",
                "到期日 (Due Date)",
                "類別 (Category)",
                "描述 (Description)",
                "受款人 (Payee)",
                "金額 (Amount)",
                "狀態 (Status)",
            ],
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportView::Receivables => "上澄聯合_應收帳款節點.csv",
            ExportView::Payables => "上澄聯合_支付節點.csv",
        }
    }

    /// Whether `node` belongs in this view
    pub fn includes(&self, node: &FinancialNode) -> bool {
        match self {
            ExportView::Receivables => node.is_income(),
            ExportView::Payables => node.is_expense(),
        }
    }

    fn record(&self, node: &FinancialNode) -> Vec<String> {
        let mut rec = vec![node.id.clone(), node.due_date.to_string()];
        if *self == ExportView::Payables {
            rec.push(node.category.map(|c| c.label()).unwrap_or_default().to_string());
        }
        rec.extend([
            node.description.clone(),
            node.related_party.clone(),
            node.amount.to_string(),
            node.status.code().to_string(),
        ]);
        rec
    }
}

/// Write the nodes of `view` (others skipped) as BOM-prefixed CSV.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(mut out: W, view: ExportView, nodes: &[FinancialNode]) -> csv::Result<usize> {
    out.write_all(BOM)?;
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(view.headers())?;

    let mut written = 0;
    for node in nodes.iter().filter(|n| view.includes(n)) {
        wtr.write_record(view.record(node))?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

pub fn export_to_path(path: impl AsRef<Path>, view: ExportView, nodes: &[FinancialNode]) -> csv::Result<usize> {
    let file = File::create(path.as_ref())?;
    write_csv(file, view, nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_nodes;

    fn render(view: ExportView) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, view, &fallback_nodes()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_receivables_export() {
        let out = render(ExportView::Receivables);
        assert!(out.starts_with('\u{FEFF}'));
        let lines: Vec<_> = out.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "ID,到期日 (Due Date),項目描述 (Description),客戶/對象 (Client),金額 (Amount),狀態 (Status)"
        );
        assert_eq!(
            lines[1],
            "1,2023-10-25,Project Alpha - 第一階段設計 (SD),Skyline 開發,1250000,OVERDUE"
        );
    }

    #[test]
    fn test_payables_export_has_category_label() {
        let out = render(ExportView::Payables);
        let lines: Vec<_> = out.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("ID,到期日 (Due Date),類別 (Category),"));
        assert_eq!(
            lines[1],
            "4,2023-10-30,複委託支付節點,機電工程 (MEP) 顧問費 - 第一期,Volts & Pipes 機電顧問,450000,PENDING"
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let nodes = vec![FinancialNode::income(
            "x",
            chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            "設計, 第二期",
            10.5,
            "A",
        )];
        let mut buf = Vec::new();
        assert_eq!(write_csv(&mut buf, ExportView::Receivables, &nodes).unwrap(), 1);
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("x,2024-01-02,\"設計, 第二期\",A,10.5,PENDING"));
    }
}
