// ==========================================
// 团队产能规划 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、纯函数规则
// 红线: 不含数据访问逻辑,不含网络调用
// ==========================================

pub mod capacity;
pub mod ledger;
pub mod member;
pub mod plan;
pub mod types;

// 重导出核心类型
pub use capacity::{AdjustmentResult, CapacityAdjustment, DragDrop, ReassignOutcome, Reassignment};
pub use ledger::{LedgerEntry, LedgerPage, MoveOutcome};
pub use member::{balance_score, utilization_pct, CapacitySnapshot, Member, WorkItem};
pub use plan::{
    AnalysisBundle, ImbalanceAnalysis, ImpactPreview, MemberLoad, MemberRef, Move, RebalancePlan,
    SubmissionPayload,
};
pub use types::{AdjustmentKind, ApplyStatus, EditorPhase, LoadBand, WorkItemKind};
