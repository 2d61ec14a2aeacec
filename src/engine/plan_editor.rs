// ==========================================
// 团队产能规划 - 再平衡方案编辑器
// ==========================================
// 职责: 维护"原始建议"与"可编辑方案"两份方案，支持逐项修改目标成员、
//       偏离检测（人工覆写）、重置、生成提交负载
// 红线: 人工覆写标志是 (原始, 可编辑) 的纯函数，只在编辑器自身的变更中重算
// 红线: 本地编辑从不修改产能快照
// ==========================================

use thiserror::Error;

use crate::domain::member::CapacitySnapshot;
use crate::domain::plan::{AnalysisBundle, ImbalanceAnalysis, MemberRef, RebalancePlan, SubmissionPayload};
use crate::domain::types::{ApplyStatus, EditorPhase};
use crate::engine::impact::{ImpactEngine, ImpactTable};
use crate::i18n::t_with_args;

// ==========================================
// EditorError - 编辑器本地校验错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("尚未加载再平衡建议")]
    NoPlanLoaded,

    #[error("移动项序号越界: index={index}, len={len}")]
    MoveIndexOutOfRange { index: usize, len: usize },

    #[error("目标成员不在当前产能快照中: {0}")]
    UnknownMember(String),

    #[error("当前阶段不允许该操作: phase={0:?}")]
    InvalidPhase(EditorPhase),
}

// 原始建议（不可变）
#[derive(Debug, Clone)]
struct Proposal {
    sprint_id: Option<String>,
    analysis: ImbalanceAnalysis,
    plan: RebalancePlan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Loaded,
    Applying,
    Settled(ApplyStatus),
}

// ==========================================
// PlanEditor - 方案编辑器
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanEditor {
    proposal: Option<Proposal>,
    editable: RebalancePlan,
    manual_override: bool,           // 仅在编辑器变更时重算的缓存
    stage: Stage,
}

impl Default for PlanEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanEditor {
    pub fn new() -> Self {
        Self {
            proposal: None,
            editable: RebalancePlan::default(),
            manual_override: false,
            stage: Stage::Idle,
        }
    }

    // ==========================================
    // 生命周期
    // ==========================================

    /// 用新的失衡分析初始化编辑器
    ///
    /// 可编辑方案为建议方案的结构拷贝，人工覆写状态随之清零
    pub fn initialize(&mut self, bundle: AnalysisBundle, sprint_id: Option<String>) {
        tracing::debug!(moves = bundle.plan.len(), "初始化方案编辑器");
        self.editable = bundle.plan.clone();
        self.proposal = Some(Proposal {
            sprint_id,
            analysis: bundle.analysis,
            plan: bundle.plan,
        });
        self.stage = Stage::Loaded;
        self.recompute_override();
    }

    /// 丢弃当前方案，回到 Idle（快照/分析失效后等待重新拉取）
    pub fn clear(&mut self) {
        self.proposal = None;
        self.editable = RebalancePlan::default();
        self.stage = Stage::Idle;
        self.recompute_override();
    }

    /// 恢复为原始建议
    pub fn reset(&mut self) -> Result<(), EditorError> {
        self.ensure_editable()?;
        let original = self.original()?.plan.clone();
        self.editable = original;
        self.recompute_override();
        Ok(())
    }

    // ==========================================
    // 编辑
    // ==========================================

    /// 修改第 index 个移动项的目标成员
    ///
    /// # 说明
    /// - 目标成员必须存在于当前产能快照，否则为本地校验失败，状态不变
    /// - 允许目标等于来源（撤销该项建议），提交时该项会被剔除
    /// - 影响预览在下一次聚合前保持旧值
    pub fn set_destination(
        &mut self,
        index: usize,
        member_id: &str,
        snapshot: &CapacitySnapshot,
    ) -> Result<(), EditorError> {
        self.ensure_editable()?;

        let len = self.editable.len();
        if index >= len {
            return Err(EditorError::MoveIndexOutOfRange { index, len });
        }

        let member = snapshot
            .member(member_id)
            .ok_or_else(|| EditorError::UnknownMember(member_id.to_string()))?;

        let to = MemberRef::new(member.member_id.clone(), member.name.clone());
        if let Some(next) = self.editable.with_destination(index, to) {
            self.editable = next;
        }
        self.recompute_override();
        Ok(())
    }

    /// 基于快照重新聚合影响，并回填各移动项的预览
    pub fn recompute_impact(&mut self, engine: &ImpactEngine, snapshot: &CapacitySnapshot) -> ImpactTable {
        let table = engine.aggregate(&self.editable, snapshot);
        self.editable = engine.refresh_previews(&self.editable, &table);
        table
    }

    // ==========================================
    // 派生状态
    // ==========================================

    /// 人工覆写标志
    pub fn compute_override(&self) -> bool {
        self.manual_override
    }

    fn recompute_override(&mut self) {
        self.manual_override = match &self.proposal {
            Some(p) => self.editable.diverges_from(&p.plan),
            None => false,
        };
    }

    /// 覆写提示文本（未偏离时为 None）
    pub fn override_warning(&self) -> Option<String> {
        if !self.manual_override {
            return None;
        }
        let original = self.proposal.as_ref()?;
        let changed = self.editable.changed_count(&original.plan);
        Some(t_with_args("plan_editor.override_warning", &[("changed", &changed.to_string())]))
    }

    pub fn phase(&self) -> EditorPhase {
        match self.stage {
            Stage::Idle => EditorPhase::Idle,
            Stage::Loaded if self.manual_override => EditorPhase::Edited,
            Stage::Loaded => EditorPhase::Ready,
            Stage::Applying => EditorPhase::Applying,
            Stage::Settled(status) => EditorPhase::settled(status),
        }
    }

    pub fn editable_plan(&self) -> &RebalancePlan {
        &self.editable
    }

    pub fn original_plan(&self) -> Option<&RebalancePlan> {
        self.proposal.as_ref().map(|p| &p.plan)
    }

    pub fn analysis(&self) -> Option<&ImbalanceAnalysis> {
        self.proposal.as_ref().map(|p| &p.analysis)
    }

    pub fn sprint_id(&self) -> Option<&str> {
        self.proposal.as_ref().and_then(|p| p.sprint_id.as_deref())
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 生成提交负载（剔除 from == to 的空操作项）
    pub fn build_submission_payload(&self) -> Result<SubmissionPayload, EditorError> {
        let original = self.original()?;
        Ok(SubmissionPayload {
            plan: self.editable.effective(),
            sprint_id: original.sprint_id.clone(),
            manual_override: self.compute_override(),
            imbalance_analysis: original.analysis.clone(),
        })
    }

    /// 进入 Applying，返回本次提交负载
    pub fn begin_apply(&mut self) -> Result<SubmissionPayload, EditorError> {
        self.ensure_editable()?;
        let payload = self.build_submission_payload()?;
        self.stage = Stage::Applying;
        Ok(payload)
    }

    /// 收到提交结果
    pub fn finish_apply(&mut self, status: ApplyStatus) {
        if self.stage == Stage::Applying {
            self.stage = Stage::Settled(status);
        }
    }

    /// 整体请求失败：回到可编辑状态，编辑内容保持不变以便重试
    pub fn abort_apply(&mut self) {
        if self.stage == Stage::Applying {
            self.stage = Stage::Loaded;
        }
    }

    fn original(&self) -> Result<&Proposal, EditorError> {
        self.proposal.as_ref().ok_or(EditorError::NoPlanLoaded)
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        match self.stage {
            Stage::Loaded => Ok(()),
            Stage::Idle => Err(EditorError::NoPlanLoaded),
            _ => Err(EditorError::InvalidPhase(self.phase())),
        }
    }
}
