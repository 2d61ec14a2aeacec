// ==========================================
// 团队产能规划 - 再平衡台账领域模型
// ==========================================
// 职责: 方案提交的审计记录（只追加，不修改）
// 用途: 审计追踪、部分失败明细展示
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::plan::SubmissionPayload;
use crate::domain::types::ApplyStatus;
use crate::i18n::t_with_args;

// ==========================================
// MoveOutcome - 单项提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub work_item_id: String,
    #[serde(default)]
    pub work_item_title: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,       // 失败原因（如：负责人已在方案外变更）
}

// ==========================================
// LedgerEntry - 台账记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub entry_id: String,
    pub team_id: String,
    #[serde(default)]
    pub sprint_id: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub triggered_by: String,
    pub total_points_moved: f64,
    pub total_moves: usize,          // 提交（尝试）的移动项数
    pub manual_override: bool,
    pub status: ApplyStatus,
    #[serde(default)]
    pub outcomes: Vec<MoveOutcome>,
}

impl LedgerEntry {
    /// 根据提交负载与逐项结果生成台账记录
    ///
    /// 状态按提交的移动项数推导，未返回结果的移动项视为未确认（不计成功）；
    /// 后端报告 `Partial` 时优先采用，未返回任何逐项结果时以 `reported` 为准
    pub fn from_apply(
        team_id: &str,
        payload: &SubmissionPayload,
        mut outcomes: Vec<MoveOutcome>,
        reported: Option<ApplyStatus>,
        triggered_by: &str,
    ) -> Self {
        // 回填标题，便于展示失败项
        for outcome in outcomes.iter_mut() {
            if outcome.work_item_title.is_none() {
                outcome.work_item_title = payload
                    .plan
                    .moves
                    .iter()
                    .find(|m| m.work_item_id == outcome.work_item_id)
                    .map(|m| m.work_item_title.clone());
            }
        }

        let total_moves = payload.plan.len();
        let status = if outcomes.is_empty() {
            reported.unwrap_or(ApplyStatus::Applied)
        } else {
            let succeeded = payload
                .plan
                .moves
                .iter()
                .filter(|m| {
                    outcomes
                        .iter()
                        .any(|o| o.success && o.work_item_id == m.work_item_id)
                })
                .count();
            match (reported, ApplyStatus::from_counts(succeeded, total_moves)) {
                (Some(ApplyStatus::Partial), _) => ApplyStatus::Partial,
                (_, derived) => derived,
            }
        };

        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            sprint_id: payload.sprint_id.clone(),
            applied_at: Utc::now(),
            triggered_by: triggered_by.to_string(),
            total_points_moved: payload.plan.total_points(),
            total_moves,
            manual_override: payload.manual_override,
            status,
            outcomes,
        }
    }

    pub fn failed_moves(&self) -> Vec<&MoveOutcome> {
        self.outcomes.iter().filter(|o| !o.success).collect()
    }

    pub fn succeeded_moves(&self) -> Vec<&MoveOutcome> {
        self.outcomes.iter().filter(|o| o.success).collect()
    }

    /// 实际成功转移的点数
    pub fn points_applied(&self, payload: &SubmissionPayload) -> f64 {
        payload
            .plan
            .moves
            .iter()
            .filter(|m| {
                self.outcomes
                    .iter()
                    .any(|o| o.success && o.work_item_id == m.work_item_id)
            })
            .map(|m| m.points_moved)
            .sum()
    }

    /// 生成简短摘要文本
    pub fn summary_text(&self) -> String {
        let status_key = format!("ledger.status.{}", self.status.as_str());
        let mut text = t_with_args(
            "ledger.summary",
            &[
                ("status", &crate::i18n::t(&status_key)),
                ("moves", &self.total_moves.to_string()),
                ("points", &format!("{:.1}", self.total_points_moved)),
            ],
        );

        let failed: Vec<String> = self
            .failed_moves()
            .iter()
            .map(|o| match &o.work_item_title {
                Some(title) => format!("{}({})", o.work_item_id, title),
                None => o.work_item_id.clone(),
            })
            .collect();
        if !failed.is_empty() {
            text.push_str("; ");
            text.push_str(&t_with_args("ledger.failed_items", &[("items", &failed.join(", "))]));
        }
        text
    }
}

// ==========================================
// LedgerPage - 台账分页（新到旧）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total: u64,
}

impl LedgerPage {
    pub fn has_more(&self) -> bool {
        (u64::from(self.page) + 1) * u64::from(self.page_size) < self.total
    }
}
