// ==========================================
// 团队产能规划 - 规划会话 API
// ==========================================
// 职责: 每个团队一个规划会话，组合
//       方案编辑器 + 单项改派通道 + 方案提交 + 台账
// 红线: 会话状态锁从不跨 .await 持有
// 红线: 本地编辑只改编辑器自己的副本，产能快照只由
//       提交/改派成功/产能调整成功使其失效并重新拉取
// ==========================================

mod adjustment;
mod apply;
mod history;
mod reassignment;
mod session;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::client::CapacityService;
use crate::config::PlannerConfig;
use crate::domain::member::CapacitySnapshot;
use crate::domain::plan::RebalancePlan;
use crate::domain::types::EditorPhase;
use crate::engine::events::{CapacityEvent, CapacityEventPublisher, CapacityEventType, OptionalEventPublisher};
use crate::engine::impact::{ImpactEngine, ImpactTable};
use crate::engine::plan_editor::PlanEditor;
use crate::repository::LedgerRepository;

pub use apply::ApplyReport;

// ==========================================
// PlanningApi - 会话注册表
// ==========================================

/// 规划 API
///
/// 职责：
/// 1. 按团队维护规划会话（同一团队共享同一个提交闸门）
/// 2. 注入外部服务、本地台账与事件发布器
pub struct PlanningApi {
    service: Arc<dyn CapacityService>,
    ledger_repo: Option<Arc<LedgerRepository>>,
    config: PlannerConfig,
    event_publisher: OptionalEventPublisher,
    sessions: Mutex<HashMap<String, Arc<TeamPlanningSession>>>,
}

impl PlanningApi {
    pub fn new(
        service: Arc<dyn CapacityService>,
        ledger_repo: Option<Arc<LedgerRepository>>,
        config: PlannerConfig,
        event_publisher: Option<Arc<dyn CapacityEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        Self {
            service,
            ledger_repo,
            config,
            event_publisher,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// 获取（或创建）团队会话
    pub fn session(&self, team_id: &str) -> ApiResult<Arc<TeamPlanningSession>> {
        if team_id.trim().is_empty() {
            return Err(ApiError::Validation("团队ID不能为空".to_string()));
        }

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ApiError::Internal(format!("会话表锁获取失败: {}", e)))?;

        let session = sessions.entry(team_id.to_string()).or_insert_with(|| {
            tracing::debug!(team_id, "创建规划会话");
            Arc::new(TeamPlanningSession::new(
                team_id,
                self.service.clone(),
                self.ledger_repo.clone(),
                self.config.clone(),
                self.event_publisher.clone(),
            ))
        });
        Ok(session.clone())
    }

    /// 关闭并移除团队会话（在途请求的响应将被丢弃）
    pub fn close_session(&self, team_id: &str) -> ApiResult<bool> {
        let removed = self
            .sessions
            .lock()
            .map_err(|e| ApiError::Internal(format!("会话表锁获取失败: {}", e)))?
            .remove(team_id);

        match removed {
            Some(session) => {
                session.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn team_ids(&self) -> ApiResult<Vec<String>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| ApiError::Internal(format!("会话表锁获取失败: {}", e)))?;
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
}

// ==========================================
// TeamPlanningSession - 单团队规划会话
// ==========================================

/// 异步加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 响应已安装
    Loaded,
    /// 响应过期（已有更新的请求或会话已关闭），被丢弃
    Discarded,
}

/// 会话视图（供渲染层读取）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub phase: EditorPhase,
    pub manual_override: bool,
    pub override_warning: Option<String>,
    pub plan: RebalancePlan,
    pub impact: Option<ImpactTable>,
    /// 快照已失效但尚未重新拉取
    pub snapshot_stale: bool,
}

// 会话可变状态（同步锁保护）
#[derive(Debug, Default)]
struct SessionState {
    editor: PlanEditor,
    snapshot: Option<CapacitySnapshot>,
    impact: Option<ImpactTable>,
    sprint_id: Option<String>,
    snapshot_stale: bool,
    closed: bool,
}

impl SessionState {
    // 快照与方案都在时重新聚合影响
    fn recompute_impact(&mut self, engine: &ImpactEngine) {
        let has_plan = self.editor.original_plan().is_some();
        self.impact = match &self.snapshot {
            Some(snapshot) if has_plan => Some(self.editor.recompute_impact(engine, snapshot)),
            _ => None,
        };
    }
}

pub struct TeamPlanningSession {
    team_id: String,
    service: Arc<dyn CapacityService>,
    ledger_repo: Option<Arc<LedgerRepository>>,
    config: PlannerConfig,
    event_publisher: OptionalEventPublisher,
    engine: ImpactEngine,
    state: Mutex<SessionState>,
    analysis_generation: AtomicU64,
    snapshot_generation: AtomicU64,
    // 在途改派的工作项
    reassign_in_flight: Mutex<HashSet<String>>,
    // 每团队至多一个在途提交（用于拒绝重复提交）
    apply_in_flight: AtomicBool,
    // 提交与分析安装互斥（加载只在安装时短暂持有）
    apply_gate: tokio::sync::Mutex<()>,
}

impl TeamPlanningSession {
    pub fn new(
        team_id: &str,
        service: Arc<dyn CapacityService>,
        ledger_repo: Option<Arc<LedgerRepository>>,
        config: PlannerConfig,
        event_publisher: OptionalEventPublisher,
    ) -> Self {
        let engine = ImpactEngine::from_config(&config);
        Self {
            team_id: team_id.to_string(),
            service,
            ledger_repo,
            config,
            event_publisher,
            engine,
            state: Mutex::new(SessionState::default()),
            analysis_generation: AtomicU64::new(0),
            snapshot_generation: AtomicU64::new(0),
            reassign_in_flight: Mutex::new(HashSet::new()),
            apply_in_flight: AtomicBool::new(false),
            apply_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    fn lock_state(&self) -> ApiResult<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|e| ApiError::Internal(format!("会话状态锁获取失败: {}", e)))
    }

    fn next_analysis_generation(&self) -> u64 {
        self.analysis_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_snapshot_generation(&self) -> u64 {
        self.snapshot_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current_analysis(&self, generation: u64) -> bool {
        self.analysis_generation.load(Ordering::SeqCst) == generation
    }

    fn is_current_snapshot(&self, generation: u64) -> bool {
        self.snapshot_generation.load(Ordering::SeqCst) == generation
    }

    fn publish(&self, event_type: CapacityEventType, work_item_id: Option<&str>) {
        let mut event = CapacityEvent::new(&self.team_id, event_type, Some("planning_session".to_string()));
        if let Some(id) = work_item_id {
            event = event.with_work_item(id);
        }
        self.event_publisher.publish(event);
    }

    /// 提交后分析失效：丢弃提交期间发起的分析请求
    fn invalidate_analysis(&self) {
        self.next_analysis_generation();
    }

    /// 标记快照失效，丢弃此前发起的快照请求
    fn invalidate_snapshot(&self) -> ApiResult<()> {
        self.next_snapshot_generation();
        self.lock_state()?.snapshot_stale = true;
        Ok(())
    }

    /// 快照失效后尽力重新拉取（失败只记录告警，快照保持失效标记）
    async fn refresh_after_mutation(&self, reason: &str) {
        if let Err(e) = self.refresh_snapshot().await {
            tracing::warn!(team_id = %self.team_id, reason, error = %e, "快照重新拉取失败");
        }
    }
}

// 在途改派登记，离开作用域时自动注销（成功、失败或被取消）
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, key: &str) -> ApiResult<Option<Self>> {
        let mut in_flight = set
            .lock()
            .map_err(|e| ApiError::Internal(format!("在途集合锁获取失败: {}", e)))?;
        if !in_flight.insert(key.to_string()) {
            return Ok(None);
        }
        Ok(Some(Self {
            set,
            key: key.to_string(),
        }))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.key);
    }
}

// 在途提交标记，离开作用域时自动清除
struct ApplyFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ApplyFlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ApplyFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
