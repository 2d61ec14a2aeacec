// ==========================================
// 团队产能规划 - 成员与产能快照领域模型
// ==========================================
// 职责: 成员产能/负载、工作项归属、团队产能快照
// 红线: 本子系统内只读，仅由外部产能服务更新
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::WorkItemKind;

/// 产能为 0 时视为满载
pub const SATURATED_UTILIZATION_PCT: f64 = 100.0;

/// 利用率（百分比）
///
/// 有效产能 <= 0 时返回 100，保证下游排序/阈值判断不会遇到 NaN 或 Infinity
pub fn utilization_pct(workload: f64, effective_capacity: f64) -> f64 {
    if effective_capacity <= 0.0 {
        return SATURATED_UTILIZATION_PCT;
    }
    workload / effective_capacity * 100.0
}

/// 团队均衡度评分
///
/// 1 - 方差(min(利用率, 1))，下限 0；成员为空时为 0
pub fn balance_score<I>(utilizations_pct: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let loads: Vec<f64> = utilizations_pct
        .into_iter()
        .map(|u| (u / 100.0).min(1.0))
        .collect();
    if loads.is_empty() {
        return 0.0;
    }
    let n = loads.len() as f64;
    let mean = loads.iter().sum::<f64>() / n;
    let variance = loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance).max(0.0)
}

// ==========================================
// WorkItem - 工作项（任务/故事）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub work_item_id: String,        // 工作项ID
    pub title: String,               // 标题
    #[serde(default)]
    pub story_id: Option<String>,    // 所属故事（可选）
    #[serde(default)]
    pub kind: WorkItemKind,          // 任务/故事
    pub points: f64,                 // 点数（非负）
    pub owner_id: String,            // 当前负责人
}

// ==========================================
// Member - 团队成员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub member_id: String,
    pub name: String,
    pub base_capacity: f64,          // 基础产能（点/周期）
    pub effective_capacity: f64,     // 扣减请假/覆盖后的有效产能
    pub current_workload: f64,       // 当前负载（名下工作项点数之和）
    #[serde(default)]
    pub work_items: Vec<WorkItem>,
}

impl Member {
    /// 当前利用率（百分比）
    pub fn utilization(&self) -> f64 {
        utilization_pct(self.current_workload, self.effective_capacity)
    }

    /// 剩余产能（不小于 0）
    pub fn remaining_capacity(&self) -> f64 {
        (self.effective_capacity - self.current_workload).max(0.0)
    }
}

// ==========================================
// CapacitySnapshot - 团队产能快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub team_id: String,
    #[serde(default)]
    pub sprint_id: Option<String>,
    pub members: Vec<Member>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl CapacitySnapshot {
    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.member_id == member_id)
    }

    pub fn contains_member(&self, member_id: &str) -> bool {
        self.member(member_id).is_some()
    }

    /// 查找工作项及其当前负责人
    pub fn find_work_item(&self, work_item_id: &str) -> Option<(&Member, &WorkItem)> {
        self.members.iter().find_map(|m| {
            m.work_items
                .iter()
                .find(|w| w.work_item_id == work_item_id)
                .map(|w| (m, w))
        })
    }

    pub fn team_capacity(&self) -> f64 {
        self.members.iter().map(|m| m.effective_capacity).sum()
    }

    pub fn team_workload(&self) -> f64 {
        self.members.iter().map(|m| m.current_workload).sum()
    }

    /// 团队整体利用率
    pub fn team_utilization(&self) -> f64 {
        utilization_pct(self.team_workload(), self.team_capacity())
    }

    /// 超载成员（利用率 > 阈值）
    pub fn overloaded_members(&self, threshold_pct: f64) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.utilization() > threshold_pct)
            .collect()
    }

    /// 低负载成员（利用率 < 阈值）
    pub fn underutilized_members(&self, threshold_pct: f64) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.utilization() < threshold_pct)
            .collect()
    }

    pub fn balance_score(&self) -> f64 {
        balance_score(self.members.iter().map(|m| m.utilization()))
    }
}
