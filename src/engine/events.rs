// ==========================================
// 团队产能规划 - 失效事件发布
// ==========================================
// 职责: 定义产能快照/失衡分析失效事件与发布 trait
// 说明: 会话层只发布事件，订阅方（渲染层）决定如何刷新
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::broadcast;

// ==========================================
// 事件类型
// ==========================================

/// 失效事件触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityEventType {
    /// 方案已提交（快照与分析同时失效）
    PlanApplied,
    /// 单项改派成功（仅快照失效）
    WorkItemReassigned,
    /// 产能调整成功（仅快照失效）
    CapacityAdjusted,
    /// 快照已重新拉取
    SnapshotRefreshed,
    /// 分析已重新加载
    AnalysisReloaded,
}

impl CapacityEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            CapacityEventType::PlanApplied => "PlanApplied",
            CapacityEventType::WorkItemReassigned => "WorkItemReassigned",
            CapacityEventType::CapacityAdjusted => "CapacityAdjusted",
            CapacityEventType::SnapshotRefreshed => "SnapshotRefreshed",
            CapacityEventType::AnalysisReloaded => "AnalysisReloaded",
        }
    }

    /// 是否使失衡分析失效
    pub fn invalidates_analysis(&self) -> bool {
        matches!(self, CapacityEventType::PlanApplied)
    }
}

/// 失效事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEvent {
    pub team_id: String,
    pub event_type: CapacityEventType,
    /// 事件来源描述
    pub source: Option<String>,
    /// 相关工作项（改派时）
    pub work_item_id: Option<String>,
}

impl CapacityEvent {
    pub fn new(team_id: &str, event_type: CapacityEventType, source: Option<String>) -> Self {
        Self {
            team_id: team_id.to_string(),
            event_type,
            source,
            work_item_id: None,
        }
    }

    pub fn with_work_item(mut self, work_item_id: &str) -> Self {
        self.work_item_id = Some(work_item_id.to_string());
        self
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 失效事件发布者
pub trait CapacityEventPublisher: Send + Sync {
    /// 发布事件
    fn publish(&self, event: CapacityEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl CapacityEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: CapacityEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - team_id={}, event_type={}",
            event.team_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 基于 broadcast 通道的发布者，供多个视图订阅
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<CapacityEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CapacityEvent> {
        self.sender.subscribe()
    }
}

impl CapacityEventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: CapacityEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        // 无订阅者时 send 返回错误，视为正常
        if self.sender.send(event).is_err() {
            tracing::debug!("BroadcastEventPublisher: 当前无订阅者");
        }
        Ok(())
    }
}

/// 可选的事件发布者包装
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn CapacityEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn CapacityEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（失败仅记录告警，不影响主流程）
    pub fn publish(&self, event: CapacityEvent) {
        if let Some(publisher) = &self.inner {
            let event_type = event.event_type;
            if let Err(e) = publisher.publish(event) {
                tracing::warn!("发布失效事件失败: event_type={}, error={}", event_type.as_str(), e);
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}
