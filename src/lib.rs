// ==========================================
// 团队产能规划 - 核心库
// ==========================================
// 职责: 负载再平衡方案编辑器
//       (建议方案 vs 人工编辑、单项改派、方案提交、审计台账)
// 技术栈: Tokio + Rust + SQLite
// 系统定位: 决策支持 (人工最终控制权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 本地台账
pub mod repository;

// 引擎层 - 方案编辑与影响聚合（同步）
pub mod engine;

// 外部产能服务
pub mod client;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 规划会话
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AdjustmentKind, ApplyStatus, EditorPhase, LoadBand, WorkItemKind};

// 领域实体
pub use domain::{
    AnalysisBundle, CapacityAdjustment, CapacitySnapshot, DragDrop, ImbalanceAnalysis, LedgerEntry,
    LedgerPage, Member, MemberRef, Move, MoveOutcome, RebalancePlan, ReassignOutcome, SubmissionPayload,
    WorkItem,
};

// 引擎
pub use engine::{EditorError, ImpactEngine, ImpactTable, MemberImpact, PlanEditor};

// 外部服务
pub use client::{ApplyResponse, CapacityService, HttpCapacityService, ServiceError};

// API
pub use api::{ApiError, ApiResult, ApplyReport, EditorView, LoadOutcome, PlanningApi, TeamPlanningSession};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "团队产能规划";
