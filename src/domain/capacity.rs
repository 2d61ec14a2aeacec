// ==========================================
// 团队产能规划 - 产能调整与直接改派领域模型
// ==========================================
// 职责: 产能调整（请假/覆盖/上调）、单项改派请求与结果
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::member::{Member, WorkItem};
use crate::domain::types::AdjustmentKind;

// ==========================================
// CapacityAdjustment - 产能调整
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityAdjustment {
    pub member_id: String,
    pub kind: AdjustmentKind,
    pub amount: f64,                 // 点数（非负）
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CapacityAdjustment {
    /// 本地校验，返回失败原因
    pub fn validate(&self) -> Result<(), String> {
        if self.member_id.trim().is_empty() {
            return Err("成员ID不能为空".to_string());
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(format!("调整量必须为非负数: {}", self.amount));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(format!("结束日期{}早于开始日期{}", end, start));
            }
        }
        Ok(())
    }
}

/// 产能调整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResult {
    pub member_id: String,
    pub effective_capacity: f64,
}

// ==========================================
// DragDrop - 拖拽手势
// ==========================================
// 拖拽来源与具体 UI 手势无关，最终归一为一次改派命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragDrop {
    pub work_item_id: String,
    pub source_member_id: String,
    pub target_member_id: String,
}

impl DragDrop {
    /// 同列内拖放（含列内排序）无语义
    pub fn is_same_column(&self) -> bool {
        self.source_member_id == self.target_member_id
    }
}

/// 改派接口返回体：更新后的工作项与成员
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassignment {
    pub work_item: WorkItem,
    #[serde(default)]
    pub member: Option<Member>,
}

/// 改派命令结果
#[derive(Debug, Clone, PartialEq)]
pub enum ReassignOutcome {
    Reassigned(Reassignment),
    NoOp, // 目标即当前负责人，未发请求
}
