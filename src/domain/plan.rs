// ==========================================
// 团队产能规划 - 再平衡方案领域模型
// ==========================================
// 职责: 移动项、方案、失衡分析、提交负载
// 红线: Move.from 一经建议不可变，只允许修改 to
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// MemberRef - 成员引用
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    pub member_id: String,
    pub member_name: String,
}

impl MemberRef {
    pub fn new(member_id: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            member_name: member_name.into(),
        }
    }
}

// ==========================================
// ImpactPreview - 单项影响预览
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactPreview {
    pub from_util_before: f64,
    pub from_util_after: f64,
    pub to_util_before: f64,
    pub to_util_after: f64,
}

// ==========================================
// Move - 移动项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub work_item_id: String,
    pub work_item_title: String,
    #[serde(default)]
    pub story_id: Option<String>,
    pub from: MemberRef,
    pub to: MemberRef,
    pub points_moved: f64,           // 建议时刻的点数，会话内不随服务端变化
    #[serde(default)]
    pub impact_preview: ImpactPreview,
}

impl Move {
    /// from == to 的移动项不产生实际变更
    pub fn is_noop(&self) -> bool {
        self.from.member_id == self.to.member_id
    }
}

// ==========================================
// RebalancePlan - 再平衡方案（有序移动项）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancePlan {
    #[serde(default)]
    pub moves: Vec<Move>,
}

impl RebalancePlan {
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// 返回修改了第 index 项目标成员的新方案（原方案不变）
    ///
    /// 越界返回 None
    pub fn with_destination(&self, index: usize, to: MemberRef) -> Option<RebalancePlan> {
        if index >= self.moves.len() {
            return None;
        }
        let mut moves = self.moves.clone();
        moves[index].to = to;
        Some(RebalancePlan { moves })
    }

    /// 剔除 from == to 的空操作项
    pub fn effective(&self) -> RebalancePlan {
        RebalancePlan {
            moves: self.moves.iter().filter(|m| !m.is_noop()).cloned().collect(),
        }
    }

    pub fn total_points(&self) -> f64 {
        self.moves.iter().map(|m| m.points_moved).sum()
    }

    /// 判断是否偏离原始建议
    ///
    /// 条数不同，或任一位置的工作项/目标成员不同即视为偏离；影响预览不参与比较
    pub fn diverges_from(&self, original: &RebalancePlan) -> bool {
        if self.moves.len() != original.moves.len() {
            return true;
        }
        self.moves.iter().zip(original.moves.iter()).any(|(edited, proposed)| {
            edited.work_item_id != proposed.work_item_id
                || edited.to.member_id != proposed.to.member_id
        })
    }

    /// 与原始建议相比目标成员不同的项数
    pub fn changed_count(&self, original: &RebalancePlan) -> usize {
        let common = self
            .moves
            .iter()
            .zip(original.moves.iter())
            .filter(|(edited, proposed)| edited.to.member_id != proposed.to.member_id)
            .count();
        common + self.moves.len().abs_diff(original.moves.len())
    }
}

// ==========================================
// ImbalanceAnalysis - 失衡分析（外部服务输出）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLoad {
    pub member_id: String,
    #[serde(default)]
    pub member_name: String,
    #[serde(default)]
    pub utilization: f64,
    #[serde(default)]
    pub current_workload: f64,
    #[serde(default)]
    pub effective_capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImbalanceAnalysis {
    #[serde(default)]
    pub overloaded_members: Vec<MemberLoad>,
    #[serde(default)]
    pub underutilized_members: Vec<MemberLoad>,
}

/// 分析接口返回体: { analysis, plan: { moves } }
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBundle {
    #[serde(default)]
    pub analysis: ImbalanceAnalysis,
    #[serde(default)]
    pub plan: RebalancePlan,
}

// ==========================================
// SubmissionPayload - 方案提交负载
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub plan: RebalancePlan,                 // 已剔除空操作项
    pub sprint_id: Option<String>,
    pub manual_override: bool,
    pub imbalance_analysis: ImbalanceAnalysis, // 原始建议对应的分析，供后端审计
}
