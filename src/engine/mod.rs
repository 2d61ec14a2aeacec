// ==========================================
// 团队产能规划 - 引擎层
// ==========================================
// 职责: 方案编辑、影响聚合、失效事件
// 红线: 引擎层全部同步，不做网络/数据库 I/O
// ==========================================

pub mod events;
pub mod impact;
pub mod plan_editor;

pub use events::{
    BroadcastEventPublisher, CapacityEvent, CapacityEventPublisher, CapacityEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use impact::{ImpactEngine, ImpactTable, MemberImpact};
pub use plan_editor::{EditorError, PlanEditor};
