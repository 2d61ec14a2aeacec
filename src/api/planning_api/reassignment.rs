use super::*;

use crate::domain::capacity::{DragDrop, ReassignOutcome};

impl TeamPlanningSession {
    // ==========================================
    // 单项改派通道（不经过方案编辑器）
    // ==========================================

    /// 立即改派单个工作项
    ///
    /// # 说明
    /// - 目标即当前负责人时不发请求，返回 NoOp
    /// - 同一工作项至多一个在途请求，重复请求本地拒绝
    /// - 成功后快照失效并重新拉取；编辑器方案与覆写标志保持不变，
    ///   即使该工作项出现在待提交的移动项中
    pub async fn reassign(&self, work_item_id: &str, target_member_id: &str) -> ApiResult<ReassignOutcome> {
        if work_item_id.trim().is_empty() {
            return Err(ApiError::Validation("工作项ID不能为空".to_string()));
        }
        if target_member_id.trim().is_empty() {
            return Err(ApiError::Validation("目标成员ID不能为空".to_string()));
        }

        {
            let state = self.lock_state()?;
            if let Some(snapshot) = &state.snapshot {
                if !snapshot.contains_member(target_member_id) {
                    return Err(ApiError::Validation(format!(
                        "目标成员不在当前产能快照中: {}",
                        target_member_id
                    )));
                }
                if let Some((owner, _)) = snapshot.find_work_item(work_item_id) {
                    if owner.member_id == target_member_id {
                        tracing::debug!(work_item_id, "目标即当前负责人，跳过改派");
                        return Ok(ReassignOutcome::NoOp);
                    }
                }
            }
        }

        let _guard = InFlightGuard::acquire(&self.reassign_in_flight, work_item_id)?
            .ok_or_else(|| ApiError::ReassignInFlight(work_item_id.to_string()))?;

        tracing::info!(team_id = %self.team_id, work_item_id, target_member_id, "发起单项改派");
        let reassignment = self
            .service
            .reassign_work_item(work_item_id, target_member_id)
            .await?;

        self.publish(CapacityEventType::WorkItemReassigned, Some(work_item_id));
        self.invalidate_snapshot()?;
        self.refresh_after_mutation("reassign").await;

        Ok(ReassignOutcome::Reassigned(reassignment))
    }

    /// 拖放：落到其他成员列等价于改派；同列（含列内排序）无语义
    pub async fn drop_work_item(&self, drop: &DragDrop) -> ApiResult<ReassignOutcome> {
        if drop.is_same_column() {
            return Ok(ReassignOutcome::NoOp);
        }
        self.reassign(&drop.work_item_id, &drop.target_member_id).await
    }

    /// 当前是否有该工作项的改派在途
    pub fn is_reassign_in_flight(&self, work_item_id: &str) -> ApiResult<bool> {
        let in_flight = self
            .reassign_in_flight
            .lock()
            .map_err(|e| ApiError::Internal(format!("在途集合锁获取失败: {}", e)))?;
        Ok(in_flight.contains(work_item_id))
    }
}
