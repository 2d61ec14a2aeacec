use super::*;

use crate::domain::ledger::LedgerEntry;
use crate::domain::plan::SubmissionPayload;

/// 方案提交报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub entry: LedgerEntry,
    /// 失败的工作项（供界面逐项展示）
    pub failed_work_items: Vec<String>,
    pub points_applied: f64,
    pub summary: String,
    /// 提交后是否已重新加载分析
    pub reloaded: bool,
}

impl TeamPlanningSession {
    // ==========================================
    // 方案提交
    // ==========================================

    /// 提交当前可编辑方案
    ///
    /// # 返回
    /// - Ok(ApplyReport): 收到后端响应（状态可能为 applied / partial / failed）
    /// - Err(ApiError::ApplyInProgress): 本团队已有提交在途
    /// - Err(ApiError::Transport / Server): 整体请求失败，编辑内容保持不变，可直接重试
    ///
    /// # 说明
    /// - 从不自动重试
    /// - 收到响应即追加台账；随后快照与分析同时失效，并按配置重新加载
    /// - 提交期间发起的分析加载被丢弃，不会把提交前的建议重新装回编辑器
    pub async fn apply(&self) -> ApiResult<ApplyReport> {
        let in_flight = ApplyFlagGuard::acquire(&self.apply_in_flight)
            .ok_or_else(|| ApiError::ApplyInProgress(self.team_id.clone()))?;
        // 分析安装只短暂持有闸门，此处等待而非拒绝
        let gate = self.apply_gate.lock().await;

        let payload = self.lock_state()?.editor.begin_apply()?;
        tracing::info!(
            team_id = %self.team_id,
            moves = payload.plan.len(),
            manual_override = payload.manual_override,
            "提交再平衡方案"
        );

        let response = match self.service.apply_plan(&self.team_id, &payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(team_id = %self.team_id, error = %e, "方案提交失败，编辑内容保留");
                if let Ok(mut state) = self.lock_state() {
                    state.editor.abort_apply();
                }
                return Err(e.into());
            }
        };

        let entry = LedgerEntry::from_apply(
            &self.team_id,
            &payload,
            response.outcomes,
            response.status,
            &self.config.actor,
        );
        self.persist_entry(&entry, &payload);

        self.lock_state()?.editor.finish_apply(entry.status);
        self.invalidate_analysis();
        self.invalidate_snapshot()?;

        tracing::info!(
            team_id = %self.team_id,
            entry_id = %entry.entry_id,
            status = %entry.status,
            failed = entry.failed_moves().len(),
            "方案提交完成"
        );
        self.publish(CapacityEventType::PlanApplied, None);

        let report_base = ApplyReport {
            failed_work_items: entry
                .failed_moves()
                .iter()
                .map(|o| o.work_item_id.clone())
                .collect(),
            points_applied: entry.points_applied(&payload),
            summary: entry.summary_text(),
            entry,
            reloaded: false,
        };

        // 释放提交闸门后再重新加载（加载本身会等待闸门）
        drop(gate);
        drop(in_flight);

        if !self.config.auto_reload_after_apply {
            return Ok(report_base);
        }

        let reloaded = match self.load_analysis(payload.sprint_id.as_deref()).await {
            Ok(outcome) => outcome == LoadOutcome::Loaded,
            Err(e) => {
                tracing::warn!(team_id = %self.team_id, error = %e, "提交后重新加载分析失败");
                false
            }
        };

        Ok(ApplyReport {
            reloaded,
            ..report_base
        })
    }

    // 本地台账写入失败不影响提交结果
    fn persist_entry(&self, entry: &LedgerEntry, payload: &SubmissionPayload) {
        let Some(repo) = &self.ledger_repo else {
            return;
        };
        if let Err(e) = repo.insert(entry, Some(payload)) {
            tracing::warn!(entry_id = %entry.entry_id, error = %e, "台账写入失败");
        }
    }
}
