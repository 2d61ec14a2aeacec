// ==========================================
// 团队产能规划 - 外部产能服务接口
// ==========================================
// 职责: 定义与外部产能/分析服务交互的契约（依赖倒置）
// 说明: 建议方案如何计算不在本系统范围内
// ==========================================

pub mod error;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::capacity::{AdjustmentResult, CapacityAdjustment, Reassignment};
use crate::domain::ledger::{LedgerPage, MoveOutcome};
use crate::domain::member::CapacitySnapshot;
use crate::domain::plan::{AnalysisBundle, SubmissionPayload};
use crate::domain::types::ApplyStatus;

pub use error::{ServiceError, ServiceResult};
pub use http::HttpCapacityService;

/// 方案提交响应：逐项结果 + 整体状态
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    #[serde(default)]
    pub outcomes: Vec<MoveOutcome>,
    #[serde(default)]
    pub status: Option<ApplyStatus>,
}

// ==========================================
// CapacityService - 外部服务契约
// ==========================================
#[async_trait]
pub trait CapacityService: Send + Sync {
    /// 拉取团队产能快照（可按迭代过滤）
    async fn fetch_capacity_snapshot(
        &self,
        team_id: &str,
        sprint_id: Option<&str>,
    ) -> ServiceResult<CapacitySnapshot>;

    /// 拉取失衡分析与建议方案
    async fn fetch_rebalance_analysis(
        &self,
        team_id: &str,
        sprint_id: Option<&str>,
    ) -> ServiceResult<AnalysisBundle>;

    /// 单项改派
    async fn reassign_work_item(
        &self,
        work_item_id: &str,
        target_member_id: &str,
    ) -> ServiceResult<Reassignment>;

    /// 提交方案
    async fn apply_plan(&self, team_id: &str, payload: &SubmissionPayload) -> ServiceResult<ApplyResponse>;

    /// 分页拉取再平衡历史（新到旧）
    async fn fetch_history(&self, team_id: &str, page: u32, page_size: u32) -> ServiceResult<LedgerPage>;

    /// 新增产能调整
    async fn add_capacity_adjustment(
        &self,
        team_id: &str,
        adjustment: &CapacityAdjustment,
    ) -> ServiceResult<AdjustmentResult>;
}
