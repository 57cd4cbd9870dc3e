//! AI CFO report and collection-reminder drafts.
//!
//! Prompts are written in Traditional Chinese for the firm's finance team.
//! A failed or empty generation degrades to a fixed notice; it never aborts
//! the command.

use anyhow::Result;
use sunchang_core::{FinancialNode, group_thousands};
use tracing::error;

use crate::config::AdvisorSection;
use crate::llm::{self, GeminiConfig};

pub const ANALYSIS_EMPTY: &str = "目前無法產生分析報告。";
pub const ANALYSIS_UNAVAILABLE: &str = "AI 分析暫時無法使用，請檢查 API Key。";
pub const EMAIL_EMPTY: &str = "無法產生郵件草稿。";
pub const EMAIL_UNAVAILABLE: &str = "AI 郵件產生功能暫時無法使用。";

/// One line per node, compact enough to keep the prompt small.
pub fn summary_line(n: &FinancialNode) -> String {
    format!(
        "{}: {} 金額 NT${} 項目: {} (狀態: {}) - 對象: {}",
        n.due_date,
        n.node_type.code(),
        n.amount,
        n.description,
        n.status.code(),
        n.related_party
    )
}

pub fn analysis_prompt(nodes: &[FinancialNode]) -> String {
    let summary = nodes.iter().map(summary_line).collect::<Vec<_>>().join("\n");
    format!(
        "你是一間建築師事務所/工程顧問公司「上澄聯合 (Sun Chang Corporation)」的財務長 (CFO)。
請分析以下的財務數據，重點關注「應收帳款時間節點」與「複委託支付節點」之間的關係。

請找出：
1. **現金流斷鏈風險**：在收到業主款項前，是否有大筆的複委託/外包款項需要支付？
2. **時間節點優化**：針對支付時間點 (Payment Timing) 與收帳時間點，提供具體的時間管理建議。
3. **高階主管摘要**：目前財務健康狀況的簡短總結。

數據資料：
{summary}

請使用「繁體中文」回答。保持專業、簡潔，並使用 Markdown 格式編排。"
    )
}

pub fn reminder_prompt(node: &FinancialNode) -> String {
    format!(
        "請撰寫一封禮貌但堅定的催款電子郵件 (Reminder Email)。

情境：
- 寄件人：上澄聯合 (財務部)
- 收件人：{}
- 專案/項目：{}
- 應付金額：NT${}
- 到期日：{}

請使用「繁體中文」撰寫。語氣應保持專業，並維護良好的商業合作關係，強調我們重視「時間節點」的承諾。",
        node.related_party,
        node.description,
        group_thousands(node.amount),
        node.due_date
    )
}

/// Reply text, or the matching notice when generation failed or came back empty.
pub fn settle(result: Result<String>, empty: &str, unavailable: &str) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => empty.to_string(),
        Err(e) => {
            let cause = format!("{e:#}");
            error!(error = %cause, "text generation failed");
            unavailable.to_string()
        }
    }
}

async fn run(section: &AdvisorSection, prompt: &str) -> Result<String> {
    let cfg = GeminiConfig::from_section(section)?;
    llm::generate(&cfg, prompt).await
}

pub async fn analyze_financial_health(section: &AdvisorSection, nodes: &[FinancialNode]) -> String {
    let result = run(section, &analysis_prompt(nodes)).await;
    settle(result, ANALYSIS_EMPTY, ANALYSIS_UNAVAILABLE)
}

pub async fn generate_reminder_email(section: &AdvisorSection, node: &FinancialNode) -> String {
    let result = run(section, &reminder_prompt(node)).await;
    settle(result, EMAIL_EMPTY, EMAIL_UNAVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sunchang_core::{ExpenseCategory, NodeStatus};

    fn overdue_receivable() -> FinancialNode {
        FinancialNode::income(
            "1",
            NaiveDate::from_ymd_opt(2023, 10, 25).unwrap(),
            "Project Alpha - 第一階段設計 (SD)",
            1_250_000.0,
            "Skyline 開發",
        )
        .with_status(NodeStatus::Overdue)
    }

    #[test]
    fn test_summary_line_format() {
        assert_eq!(
            summary_line(&overdue_receivable()),
            "2023-10-25: INCOME 金額 NT$1250000 項目: Project Alpha - 第一階段設計 (SD) (狀態: OVERDUE) - 對象: Skyline 開發"
        );
    }

    #[test]
    fn test_analysis_prompt_lists_every_node() {
        let nodes = vec![
            overdue_receivable(),
            FinancialNode::expense(
                "5",
                NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
                "結構計算與審查費",
                300_000.0,
                ExpenseCategory::Subcontract,
                "穩固結構技師事務所",
            ),
        ];
        let prompt = analysis_prompt(&nodes);
        assert!(prompt.contains("財務長 (CFO)"));
        for n in &nodes {
            assert!(prompt.contains(&summary_line(n)));
        }
    }

    #[test]
    fn test_reminder_prompt_groups_amount() {
        let prompt = reminder_prompt(&overdue_receivable());
        assert!(prompt.contains("收件人：Skyline 開發"));
        assert!(prompt.contains("應付金額：NT$1,250,000"));
        assert!(prompt.contains("到期日：2023-10-25"));
    }

    #[test]
    fn test_settle_fallbacks() {
        assert_eq!(settle(Ok("報告".into()), ANALYSIS_EMPTY, ANALYSIS_UNAVAILABLE), "報告");
        assert_eq!(settle(Ok("  ".into()), ANALYSIS_EMPTY, ANALYSIS_UNAVAILABLE), ANALYSIS_EMPTY);
        assert_eq!(
            settle(Err(anyhow::anyhow!("boom")), EMAIL_EMPTY, EMAIL_UNAVAILABLE),
            EMAIL_UNAVAILABLE
        );
    }
}
