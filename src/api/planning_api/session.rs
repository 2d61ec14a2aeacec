use super::*;

use crate::domain::plan::SubmissionPayload;

impl TeamPlanningSession {
    // ==========================================
    // 加载
    // ==========================================

    /// 拉取产能快照与失衡分析，并重新初始化编辑器
    ///
    /// # 说明
    /// - 每次调用分配新的分析代次，返回时代次已过期的响应被丢弃
    /// - 若有方案提交在途，安装前等待其结束（不取消提交）；
    ///   提交会使分析失效，因此提交期间拉取到的响应被丢弃
    pub async fn load_analysis(&self, sprint_id: Option<&str>) -> ApiResult<LoadOutcome> {
        let generation = self.next_analysis_generation();
        let snapshot_generation = self.next_snapshot_generation();

        let (snapshot, bundle) = futures::try_join!(
            self.service.fetch_capacity_snapshot(&self.team_id, sprint_id),
            self.service.fetch_rebalance_analysis(&self.team_id, sprint_id),
        )?;

        let _gate = self.apply_gate.lock().await;

        if !self.is_current_analysis(generation) {
            tracing::debug!(team_id = %self.team_id, generation, "分析响应已过期，丢弃");
            return Ok(LoadOutcome::Discarded);
        }

        {
            let mut state = self.lock_state()?;
            if state.closed {
                tracing::debug!(team_id = %self.team_id, "会话已关闭，丢弃分析响应");
                return Ok(LoadOutcome::Discarded);
            }

            let moves = bundle.plan.len();
            state.editor.initialize(bundle, sprint_id.map(str::to_string));
            state.sprint_id = sprint_id.map(str::to_string);
            if self.is_current_snapshot(snapshot_generation) {
                state.snapshot = Some(snapshot);
                state.snapshot_stale = false;
            }
            state.recompute_impact(&self.engine);

            tracing::info!(team_id = %self.team_id, sprint_id = ?sprint_id, moves, "再平衡分析已加载");
        }

        self.publish(CapacityEventType::AnalysisReloaded, None);
        Ok(LoadOutcome::Loaded)
    }

    /// 仅重新拉取产能快照（编辑器方案保持不变，影响表随快照重算）
    pub async fn refresh_snapshot(&self) -> ApiResult<LoadOutcome> {
        let generation = self.next_snapshot_generation();
        let sprint_id = self.lock_state()?.sprint_id.clone();

        let snapshot = self
            .service
            .fetch_capacity_snapshot(&self.team_id, sprint_id.as_deref())
            .await?;

        if !self.is_current_snapshot(generation) {
            tracing::debug!(team_id = %self.team_id, generation, "快照响应已过期，丢弃");
            return Ok(LoadOutcome::Discarded);
        }

        {
            let mut state = self.lock_state()?;
            if state.closed {
                return Ok(LoadOutcome::Discarded);
            }
            state.snapshot = Some(snapshot);
            state.snapshot_stale = false;
            state.recompute_impact(&self.engine);
        }

        self.publish(CapacityEventType::SnapshotRefreshed, None);
        Ok(LoadOutcome::Loaded)
    }

    /// 关闭会话：此后到达的任何响应都被丢弃
    pub fn close(&self) -> ApiResult<()> {
        self.next_analysis_generation();
        self.next_snapshot_generation();

        let mut state = self.lock_state()?;
        state.closed = true;
        state.editor.clear();
        state.impact = None;
        tracing::debug!(team_id = %self.team_id, "规划会话已关闭");
        Ok(())
    }

    // ==========================================
    // 编辑（同步，不触达网络）
    // ==========================================

    /// 修改第 index 个移动项的目标成员，并立即重算影响表
    pub fn set_destination(&self, index: usize, member_id: &str) -> ApiResult<EditorView> {
        let mut state = self.lock_state()?;
        let state = &mut *state;

        let snapshot = state.snapshot.as_ref().ok_or(ApiError::NoAnalysisLoaded)?;
        state.editor.set_destination(index, member_id, snapshot)?;
        state.impact = Some(state.editor.recompute_impact(&self.engine, snapshot));

        Ok(Self::view_of(state))
    }

    /// 恢复为原始建议
    pub fn reset(&self) -> ApiResult<EditorView> {
        let mut state = self.lock_state()?;
        state.editor.reset()?;
        state.recompute_impact(&self.engine);
        Ok(Self::view_of(&state))
    }

    // ==========================================
    // 读取
    // ==========================================

    pub fn view(&self) -> ApiResult<EditorView> {
        let state = self.lock_state()?;
        Ok(Self::view_of(&state))
    }

    pub fn phase(&self) -> ApiResult<EditorPhase> {
        Ok(self.lock_state()?.editor.phase())
    }

    pub fn override_flag(&self) -> ApiResult<bool> {
        Ok(self.lock_state()?.editor.compute_override())
    }

    pub fn override_warning(&self) -> ApiResult<Option<String>> {
        Ok(self.lock_state()?.editor.override_warning())
    }

    pub fn editable_plan(&self) -> ApiResult<RebalancePlan> {
        Ok(self.lock_state()?.editor.editable_plan().clone())
    }

    pub fn original_plan(&self) -> ApiResult<Option<RebalancePlan>> {
        Ok(self.lock_state()?.editor.original_plan().cloned())
    }

    pub fn impact_table(&self) -> ApiResult<Option<ImpactTable>> {
        Ok(self.lock_state()?.impact.clone())
    }

    pub fn snapshot(&self) -> ApiResult<Option<CapacitySnapshot>> {
        Ok(self.lock_state()?.snapshot.clone())
    }

    pub fn is_snapshot_stale(&self) -> ApiResult<bool> {
        Ok(self.lock_state()?.snapshot_stale)
    }

    pub fn build_submission_payload(&self) -> ApiResult<SubmissionPayload> {
        Ok(self.lock_state()?.editor.build_submission_payload()?)
    }

    fn view_of(state: &SessionState) -> EditorView {
        EditorView {
            phase: state.editor.phase(),
            manual_override: state.editor.compute_override(),
            override_warning: state.editor.override_warning(),
            plan: state.editor.editable_plan().clone(),
            impact: state.impact.clone(),
            snapshot_stale: state.snapshot_stale,
        }
    }
}
