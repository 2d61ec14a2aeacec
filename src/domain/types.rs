// ==========================================
// 团队产能规划 - 领域枚举类型
// ==========================================
// 职责: 方案提交状态、编辑器阶段、负载分档、工作项类型、产能调整类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ApplyStatus - 方案提交结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Applied, // 全部成功
    Partial, // 部分成功
    Failed,  // 全部失败
}

impl ApplyStatus {
    /// 由逐项结果推导整体状态
    ///
    /// 无任何移动项（空方案）视为 Applied
    pub fn from_counts(succeeded: usize, attempted: usize) -> Self {
        if succeeded == attempted {
            ApplyStatus::Applied
        } else if succeeded == 0 {
            ApplyStatus::Failed
        } else {
            ApplyStatus::Partial
        }
    }

    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyStatus::Applied => "applied",
            ApplyStatus::Partial => "partial",
            ApplyStatus::Failed => "failed",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applied" => Some(ApplyStatus::Applied),
            "partial" => Some(ApplyStatus::Partial),
            "failed" => Some(ApplyStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// EditorPhase - 方案编辑器阶段
// ==========================================
// Idle → Ready ⇄ Edited → Applying → Applied | PartiallyApplied | Failed → Idle
// Ready 与 Edited 结构相同，仅由人工覆写标志区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorPhase {
    Idle,
    Ready,
    Edited,
    Applying,
    Applied,
    PartiallyApplied,
    Failed,
}

impl EditorPhase {
    /// 是否允许编辑目标成员
    pub fn accepts_edits(&self) -> bool {
        matches!(self, EditorPhase::Ready | EditorPhase::Edited)
    }

    /// 提交结果对应的终态
    pub fn settled(status: ApplyStatus) -> Self {
        match status {
            ApplyStatus::Applied => EditorPhase::Applied,
            ApplyStatus::Partial => EditorPhase::PartiallyApplied,
            ApplyStatus::Failed => EditorPhase::Failed,
        }
    }
}

// ==========================================
// LoadBand - 成员负载分档
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBand {
    Overloaded,    // 利用率 > 超载阈值
    #[default]
    Balanced,
    Underutilized, // 利用率 < 低负载阈值
}

impl LoadBand {
    pub fn classify(utilization_pct: f64, overload_threshold_pct: f64, underutilized_threshold_pct: f64) -> Self {
        if utilization_pct > overload_threshold_pct {
            LoadBand::Overloaded
        } else if utilization_pct < underutilized_threshold_pct {
            LoadBand::Underutilized
        } else {
            LoadBand::Balanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBand::Overloaded => "overloaded",
            LoadBand::Balanced => "balanced",
            LoadBand::Underutilized => "underutilized",
        }
    }
}

// ==========================================
// WorkItemKind - 工作项类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemKind {
    #[default]
    Task,
    Story,
}

// ==========================================
// AdjustmentKind - 产能调整类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    TimeOff,  // 请假（扣减产能）
    Override, // 直接覆盖有效产能
    Boost,    // 显式上调（允许超过基础产能）
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_status_from_counts() {
        assert_eq!(ApplyStatus::from_counts(2, 2), ApplyStatus::Applied);
        assert_eq!(ApplyStatus::from_counts(1, 2), ApplyStatus::Partial);
        assert_eq!(ApplyStatus::from_counts(0, 2), ApplyStatus::Failed);
        assert_eq!(ApplyStatus::from_counts(0, 0), ApplyStatus::Applied);
    }

    #[test]
    fn test_apply_status_roundtrip_str() {
        for s in [ApplyStatus::Applied, ApplyStatus::Partial, ApplyStatus::Failed] {
            assert_eq!(ApplyStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ApplyStatus::parse("unknown"), None);
    }

    #[test]
    fn test_load_band_thresholds_are_exclusive() {
        assert_eq!(LoadBand::classify(130.0, 100.0, 70.0), LoadBand::Overloaded);
        assert_eq!(LoadBand::classify(100.0, 100.0, 70.0), LoadBand::Balanced);
        assert_eq!(LoadBand::classify(70.0, 100.0, 70.0), LoadBand::Balanced);
        assert_eq!(LoadBand::classify(20.0, 100.0, 70.0), LoadBand::Underutilized);
        assert_eq!(LoadBand::classify(95.0, 90.0, 50.0), LoadBand::Overloaded);
    }

    #[test]
    fn test_phase_accepts_edits() {
        assert!(EditorPhase::Ready.accepts_edits());
        assert!(EditorPhase::Edited.accepts_edits());
        assert!(!EditorPhase::Idle.accepts_edits());
        assert!(!EditorPhase::Applying.accepts_edits());
        assert_eq!(EditorPhase::settled(ApplyStatus::Partial), EditorPhase::PartiallyApplied);
    }
}
