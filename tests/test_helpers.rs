// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、固定场景数据、
//       以及可控时序的内存版产能服务
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use capacity_planner::client::{ApplyResponse, CapacityService, ServiceError, ServiceResult};
use capacity_planner::config::PlannerConfig;
use capacity_planner::domain::{
    AdjustmentKind, AdjustmentResult, AnalysisBundle, CapacityAdjustment, CapacitySnapshot,
    ImbalanceAnalysis, ImpactPreview, LedgerPage, Member, MemberLoad, MemberRef, Move, MoveOutcome,
    RebalancePlan, Reassignment, SubmissionPayload, WorkItem, WorkItemKind,
};
use capacity_planner::repository::LedgerRepository;
use capacity_planner::{PlanningApi, TeamPlanningSession};
use chrono::Utc;
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tokio::sync::Notify;

pub const TEAM_ID: &str = "team-1";
pub const SPRINT_ID: &str = "sprint-7";

// ==========================================
// 临时数据库
// ==========================================

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径非 UTF-8")?.to_string();

    let conn = capacity_planner::db::open_sqlite_connection(&db_path)?;
    capacity_planner::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接并创建台账仓储
pub fn create_ledger_repo(db_path: &str) -> Arc<LedgerRepository> {
    let conn = Connection::open(db_path).unwrap();
    capacity_planner::db::configure_sqlite_connection(&conn).unwrap();
    Arc::new(LedgerRepository::new(Arc::new(Mutex::new(conn))))
}

// ==========================================
// 固定场景数据
// ==========================================

pub fn work_item(id: &str, owner: &str, points: f64) -> WorkItem {
    WorkItem {
        work_item_id: id.to_string(),
        title: format!("任务 {}", id),
        story_id: Some("S-1".to_string()),
        kind: WorkItemKind::Task,
        points,
        owner_id: owner.to_string(),
    }
}

pub fn member(id: &str, capacity: f64, items: Vec<WorkItem>) -> Member {
    Member {
        member_id: id.to_string(),
        name: format!("成员{}", id),
        base_capacity: capacity,
        effective_capacity: capacity,
        current_workload: items.iter().map(|i| i.points).sum(),
        work_items: items,
    }
}

/// A 超载（13/10），B、C、D 有余量
///
/// | 成员 | 产能 | 工作项 |
/// |---|---|---|
/// | A | 10 | T1(3) T2(2) T3(8) |
/// | B | 10 | T4(4) |
/// | C | 10 | T5(5) |
/// | D | 10 | T6(2) |
pub fn scenario_snapshot() -> CapacitySnapshot {
    CapacitySnapshot {
        team_id: TEAM_ID.to_string(),
        sprint_id: Some(SPRINT_ID.to_string()),
        members: vec![
            member(
                "A",
                10.0,
                vec![work_item("T1", "A", 3.0), work_item("T2", "A", 2.0), work_item("T3", "A", 8.0)],
            ),
            member("B", 10.0, vec![work_item("T4", "B", 4.0)]),
            member("C", 10.0, vec![work_item("T5", "C", 5.0)]),
            member("D", 10.0, vec![work_item("T6", "D", 2.0)]),
        ],
        fetched_at: Utc::now(),
    }
}

pub fn mv(item: &str, from: &str, to: &str, points: f64) -> Move {
    Move {
        work_item_id: item.to_string(),
        work_item_title: format!("任务 {}", item),
        story_id: Some("S-1".to_string()),
        from: MemberRef::new(from, format!("成员{}", from)),
        to: MemberRef::new(to, format!("成员{}", to)),
        points_moved: points,
        impact_preview: ImpactPreview::default(),
    }
}

/// 建议: T1 A→B (3), T2 A→C (2)
pub fn scenario_bundle() -> AnalysisBundle {
    let load = |id: &str, workload: f64| MemberLoad {
        member_id: id.to_string(),
        member_name: format!("成员{}", id),
        utilization: workload * 10.0,
        current_workload: workload,
        effective_capacity: 10.0,
    };

    AnalysisBundle {
        analysis: ImbalanceAnalysis {
            overloaded_members: vec![load("A", 13.0)],
            underutilized_members: vec![load("B", 4.0), load("C", 5.0), load("D", 2.0)],
        },
        plan: RebalancePlan::new(vec![mv("T1", "A", "B", 3.0), mv("T2", "A", "C", 2.0)]),
    }
}

// ==========================================
// Gate - 可控的挂起点
// ==========================================

/// 调用进入后通知 `entered`，并等待 `release`
///
/// Notify 会保存一个许可，因此先 release 再进入也不会丢失
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

fn take_gate(slot: &Mutex<Option<Arc<Gate>>>) -> Option<Arc<Gate>> {
    slot.lock().unwrap().take()
}

// ==========================================
// MockCapacityService - 内存版产能服务
// ==========================================

/// 内存版产能服务
///
/// - 改派/提交成功后同步修改内存快照，模拟服务端状态
/// - 各接口可挂一次性 Gate 控制时序
/// - 可注入一次性错误与逐项失败
#[derive(Default)]
pub struct MockCapacityService {
    snapshot: Mutex<Option<CapacitySnapshot>>,
    bundle: Mutex<AnalysisBundle>,
    history: Mutex<LedgerPage>,

    /// 提交时逐项失败的工作项
    pub failing_items: Mutex<HashSet<String>>,
    /// 下一次提交的整体错误（一次性）
    pub apply_error: Mutex<Option<ServiceError>>,
    /// 下一次改派的错误（一次性）
    pub reassign_error: Mutex<Option<ServiceError>>,
    /// 提交响应不带逐项结果，只带整体状态
    pub omit_outcomes: Mutex<bool>,

    pub snapshot_gate: Mutex<Option<Arc<Gate>>>,
    pub analysis_gate: Mutex<Option<Arc<Gate>>>,
    pub reassign_gate: Mutex<Option<Arc<Gate>>>,
    pub apply_gate: Mutex<Option<Arc<Gate>>>,

    pub snapshot_calls: AtomicUsize,
    pub analysis_calls: AtomicUsize,
    pub reassign_calls: AtomicUsize,
    pub apply_calls: AtomicUsize,
    pub adjustment_calls: AtomicUsize,
    pub last_payload: Mutex<Option<SubmissionPayload>>,
}

impl MockCapacityService {
    pub fn new(snapshot: CapacitySnapshot, bundle: AnalysisBundle) -> Arc<Self> {
        let service = Self::default();
        *service.snapshot.lock().unwrap() = Some(snapshot);
        *service.bundle.lock().unwrap() = bundle;
        Arc::new(service)
    }

    pub fn scenario() -> Arc<Self> {
        Self::new(scenario_snapshot(), scenario_bundle())
    }

    pub fn set_bundle(&self, bundle: AnalysisBundle) {
        *self.bundle.lock().unwrap() = bundle;
    }

    pub fn set_history(&self, page: LedgerPage) {
        *self.history.lock().unwrap() = page;
    }

    pub fn current_snapshot(&self) -> CapacitySnapshot {
        self.snapshot.lock().unwrap().clone().unwrap()
    }

    pub fn gate_snapshot(&self) -> Arc<Gate> {
        let gate = Gate::new();
        *self.snapshot_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_analysis(&self) -> Arc<Gate> {
        let gate = Gate::new();
        *self.analysis_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_reassign(&self) -> Arc<Gate> {
        let gate = Gate::new();
        *self.reassign_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_apply(&self) -> Arc<Gate> {
        let gate = Gate::new();
        *self.apply_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fail_item(&self, work_item_id: &str) {
        self.failing_items.lock().unwrap().insert(work_item_id.to_string());
    }

    // 模拟服务端转移工作项
    fn transfer(&self, work_item_id: &str, target_member_id: &str) -> Option<(WorkItem, Member)> {
        let mut guard = self.snapshot.lock().unwrap();
        let snapshot = guard.as_mut()?;

        let source_idx = snapshot
            .members
            .iter()
            .position(|m| m.work_items.iter().any(|w| w.work_item_id == work_item_id))?;
        let target_idx = snapshot.members.iter().position(|m| m.member_id == target_member_id)?;

        let source = &mut snapshot.members[source_idx];
        let pos = source.work_items.iter().position(|w| w.work_item_id == work_item_id)?;
        let mut item = source.work_items.remove(pos);
        source.current_workload -= item.points;

        item.owner_id = target_member_id.to_string();
        let target = &mut snapshot.members[target_idx];
        target.current_workload += item.points;
        target.work_items.push(item.clone());

        Some((item, target.clone()))
    }
}

#[async_trait]
impl CapacityService for MockCapacityService {
    async fn fetch_capacity_snapshot(
        &self,
        _team_id: &str,
        _sprint_id: Option<&str>,
    ) -> ServiceResult<CapacitySnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        // 先取快照再挂起：挂起期间发生的变更不会体现在本次响应中
        let snapshot = self.snapshot.lock().unwrap().clone();
        if let Some(gate) = take_gate(&self.snapshot_gate) {
            gate.pass().await;
        }
        snapshot.ok_or_else(|| ServiceError::Server {
            status: 404,
            message: "team not found".to_string(),
        })
    }

    async fn fetch_rebalance_analysis(
        &self,
        _team_id: &str,
        _sprint_id: Option<&str>,
    ) -> ServiceResult<AnalysisBundle> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        let bundle = self.bundle.lock().unwrap().clone();
        if let Some(gate) = take_gate(&self.analysis_gate) {
            gate.pass().await;
        }
        Ok(bundle)
    }

    async fn reassign_work_item(
        &self,
        work_item_id: &str,
        target_member_id: &str,
    ) -> ServiceResult<Reassignment> {
        self.reassign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = take_gate(&self.reassign_gate) {
            gate.pass().await;
        }
        if let Some(err) = self.reassign_error.lock().unwrap().take() {
            return Err(err);
        }

        let (item, member) = self
            .transfer(work_item_id, target_member_id)
            .ok_or_else(|| ServiceError::ItemRejected {
                work_item_id: work_item_id.to_string(),
                reason: "unknown work item or member".to_string(),
            })?;
        Ok(Reassignment {
            work_item: item,
            member: Some(member),
        })
    }

    async fn apply_plan(&self, _team_id: &str, payload: &SubmissionPayload) -> ServiceResult<ApplyResponse> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        if let Some(gate) = take_gate(&self.apply_gate) {
            gate.pass().await;
        }
        if let Some(err) = self.apply_error.lock().unwrap().take() {
            return Err(err);
        }

        let failing = self.failing_items.lock().unwrap().clone();
        let mut outcomes = Vec::new();
        for mv in &payload.plan.moves {
            let owner_matches = self
                .snapshot
                .lock()
                .unwrap()
                .as_ref()
                .and_then(|s| s.find_work_item(&mv.work_item_id).map(|(m, _)| m.member_id.clone()))
                .map(|owner| owner == mv.from.member_id)
                .unwrap_or(false);

            if failing.contains(&mv.work_item_id) || !owner_matches {
                outcomes.push(MoveOutcome {
                    work_item_id: mv.work_item_id.clone(),
                    work_item_title: None,
                    success: false,
                    error: Some("owner changed since proposal".to_string()),
                });
            } else {
                self.transfer(&mv.work_item_id, &mv.to.member_id);
                outcomes.push(MoveOutcome {
                    work_item_id: mv.work_item_id.clone(),
                    work_item_title: None,
                    success: true,
                    error: None,
                });
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        let status = capacity_planner::ApplyStatus::from_counts(succeeded, outcomes.len());
        if *self.omit_outcomes.lock().unwrap() {
            outcomes.clear();
        }
        Ok(ApplyResponse {
            outcomes,
            status: Some(status),
        })
    }

    async fn fetch_history(&self, _team_id: &str, page: u32, page_size: u32) -> ServiceResult<LedgerPage> {
        let mut result = self.history.lock().unwrap().clone();
        result.page = page;
        result.page_size = page_size;
        Ok(result)
    }

    async fn add_capacity_adjustment(
        &self,
        _team_id: &str,
        adjustment: &CapacityAdjustment,
    ) -> ServiceResult<AdjustmentResult> {
        self.adjustment_calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.snapshot.lock().unwrap();
        let member = guard
            .as_mut()
            .and_then(|s| s.members.iter_mut().find(|m| m.member_id == adjustment.member_id))
            .ok_or_else(|| ServiceError::Server {
                status: 404,
                message: "member not found".to_string(),
            })?;

        member.effective_capacity = match adjustment.kind {
            AdjustmentKind::TimeOff => (member.effective_capacity - adjustment.amount).max(0.0),
            AdjustmentKind::Override => adjustment.amount,
            AdjustmentKind::Boost => member.effective_capacity + adjustment.amount,
        };
        Ok(AdjustmentResult {
            member_id: member.member_id.clone(),
            effective_capacity: member.effective_capacity,
        })
    }
}

// ==========================================
// 会话构建
// ==========================================

/// 关闭自动重载的配置（便于逐步断言）
pub fn manual_reload_config() -> PlannerConfig {
    PlannerConfig {
        auto_reload_after_apply: false,
        actor: "tester".to_string(),
        ..PlannerConfig::default()
    }
}

pub fn build_api(
    service: Arc<MockCapacityService>,
    ledger_repo: Option<Arc<LedgerRepository>>,
    config: PlannerConfig,
) -> PlanningApi {
    PlanningApi::new(service, ledger_repo, config, None)
}

/// 已加载场景分析的会话
pub async fn loaded_session(
    service: Arc<MockCapacityService>,
    config: PlannerConfig,
) -> Arc<TeamPlanningSession> {
    let api = build_api(service, None, config);
    let session = api.session(TEAM_ID).unwrap();
    session.load_analysis(Some(SPRINT_ID)).await.unwrap();
    session
}
