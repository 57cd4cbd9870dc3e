//! Plain-text views printed to stdout

use chrono::NaiveDate;
use sunchang_core::{
    CashFlowPoint, ExpenseCategory, FinancialNode, FIRM_TIMEZONE, category_subtotals,
    dashboard_stats, format_twd, upcoming_payments,
};
use sunchang_sheet::Snapshot;

pub fn source_line(snap: &Snapshot) -> String {
    let when = snap.loaded_at.with_timezone(&FIRM_TIMEZONE).format("%Y-%m-%d %H:%M:%S");
    let source = if snap.is_remote() {
        "已連線至雲端"
    } else {
        "離線模式 (內建資料)"
    };
    let mut line = format!("{source} | 上個同步時間: {when} | {} 筆節點", snap.nodes.len());
    if snap.degraded_rows > 0 {
        line.push_str(&format!(" | {} 筆欄位已套用預設值", snap.degraded_rows));
    }
    line
}

pub fn dashboard(snap: &Snapshot, today: NaiveDate, upcoming_days: i64) -> String {
    let stats = dashboard_stats(&snap.nodes);
    let mut out = String::new();
    out.push_str("# 財務總覽儀表板\n\n");
    out.push_str(&format!("{}\n\n", source_line(snap)));
    out.push_str(&format!("應收帳款節點 (AR)   {}\n", format_twd(stats.total_receivables)));
    out.push_str(&format!("支付節點與支出 (AP) {}\n", format_twd(stats.total_payables)));
    out.push_str(&format!("逾期/警示項目       {}\n", stats.overdue_count));
    out.push_str(&format!("淨現金流預測        {}\n", format_twd(stats.net_cash_flow)));

    let due = upcoming_payments(&snap.nodes, today, upcoming_days);
    if !due.is_empty() {
        out.push_str(&format!("\n## {upcoming_days} 天內到期的支付節點\n"));
        for n in due {
            out.push_str(&format!(
                "- {} {} {} ({})\n",
                n.due_date,
                n.description,
                format_twd(n.amount),
                n.related_party
            ));
        }
    }
    out
}

fn node_line(n: &FinancialNode) -> String {
    let category = n.category.map(|c| c.label()).unwrap_or("-");
    format!(
        "{:<8} {:<10} {:<14} {:<32} {:<20} {:>16} {}",
        n.id,
        n.due_date.to_string(),
        if n.is_expense() { category } else { "" },
        n.description,
        n.related_party,
        format_twd(n.amount),
        n.status.label(n.node_type)
    )
}

pub fn node_table(nodes: &[&FinancialNode]) -> String {
    if nodes.is_empty() {
        return "(沒有資料)\n".to_string();
    }
    let mut out = String::new();
    for n in nodes {
        out.push_str(&node_line(n));
        out.push('\n');
    }
    out
}

/// Per-category expense summary for the payables view
pub fn category_summary(nodes: &[FinancialNode]) -> String {
    let subtotals = category_subtotals(nodes);
    let mut out = String::new();
    for cat in ExpenseCategory::ALL {
        let amount = subtotals.get(&cat).copied().unwrap_or(0.0);
        out.push_str(&format!("{:<14} {}\n", cat.label(), format_twd(amount)));
    }
    out
}

pub fn cash_flow(series: &[CashFlowPoint]) -> String {
    if series.is_empty() {
        return "(沒有未結清且日期可辨識的節點)\n".to_string();
    }
    let mut out = format!("{:<8} {:>18} {:>18} {:>18}\n", "月份", "預估收入", "預估支出", "累計餘額");
    for p in series {
        out.push_str(&format!(
            "{:<8} {:>18} {:>18} {:>18}\n",
            p.month,
            format_twd(p.income),
            format_twd(p.expenses),
            format_twd(p.balance)
        ));
    }
    out
}
