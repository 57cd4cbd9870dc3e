//! Static demo collection shown when no endpoint is configured or the fetch
//! fails, so the dashboard is never empty.

use chrono::NaiveDate;
use sunchang_core::{ExpenseCategory, FinancialNode, NodeStatus};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn fallback_nodes() -> Vec<FinancialNode> {
    use ExpenseCategory::{Fixed, Payroll, Subcontract};

    vec![
        // Receivables
        FinancialNode::income("1", date(2023, 10, 25), "Project Alpha - 第一階段設計 (SD)", 1_250_000.0, "Skyline 開發")
            .with_status(NodeStatus::Overdue),
        FinancialNode::income("2", date(2023, 11, 5), "Project Beta - 施工圖繪製 (CD)", 850_000.0, "Urban Living 建設"),
        FinancialNode::income("3", date(2023, 11, 15), "市中心翻新案 - 執照圖 (Permit)", 2_000_000.0, "市政府都市發展局"),
        FinancialNode::income("9", date(2023, 11, 20), "科技園區競圖案 - 簽約金", 500_000.0, "高科技園區管委會"),
        // Payables: subcontracting
        FinancialNode::expense("4", date(2023, 10, 30), "機電工程 (MEP) 顧問費 - 第一期", 450_000.0, Subcontract, "Volts & Pipes 機電顧問"),
        FinancialNode::expense("5", date(2023, 11, 1), "結構計算與審查費", 300_000.0, Subcontract, "穩固結構技師事務所"),
        FinancialNode::expense("10", date(2023, 11, 10), "綠建築標章 (LEED) 認證顧問", 150_000.0, Subcontract, "GreenLife 顧問"),
        // Payables: payroll and fixed
        FinancialNode::expense("6", date(2023, 10, 31), "十月份事務所薪資", 1_500_000.0, Payroll, "內部員工"),
        FinancialNode::expense("7", date(2023, 11, 1), "總部辦公室租金", 120_000.0, Fixed, "大樓管理委員會"),
        FinancialNode::expense("8", date(2023, 11, 5), "Autodesk & Adobe 軟體授權費", 50_000.0, Fixed, "軟體經銷商"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fallback_ids_unique_and_categories_consistent() {
        let nodes = fallback_nodes();
        assert_eq!(nodes.len(), 10);
        let ids: HashSet<_> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), nodes.len());
        assert!(nodes.iter().all(|n| n.category.is_some() == n.is_expense()));
        assert_eq!(nodes.iter().filter(|n| n.is_income()).count(), 4);
    }
}
