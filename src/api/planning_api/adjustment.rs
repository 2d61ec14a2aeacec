use super::*;

use crate::domain::capacity::{AdjustmentResult, CapacityAdjustment};

impl TeamPlanningSession {
    /// 新增产能调整（请假 / 覆盖 / 临时提升）
    ///
    /// 本地校验通过后调用外部服务；成功后快照失效并重新拉取，编辑器不受影响
    pub async fn add_capacity_adjustment(&self, adjustment: &CapacityAdjustment) -> ApiResult<AdjustmentResult> {
        adjustment.validate().map_err(ApiError::Validation)?;

        {
            let state = self.lock_state()?;
            if let Some(snapshot) = &state.snapshot {
                if !snapshot.contains_member(&adjustment.member_id) {
                    return Err(ApiError::Validation(format!(
                        "成员不在当前产能快照中: {}",
                        adjustment.member_id
                    )));
                }
            }
        }

        let result = self
            .service
            .add_capacity_adjustment(&self.team_id, adjustment)
            .await?;

        tracing::info!(
            team_id = %self.team_id,
            member_id = %adjustment.member_id,
            kind = ?adjustment.kind,
            effective_capacity = result.effective_capacity,
            "产能调整已生效"
        );

        self.publish(CapacityEventType::CapacityAdjusted, None);
        self.invalidate_snapshot()?;
        self.refresh_after_mutation("capacity_adjustment").await;

        Ok(result)
    }
}
