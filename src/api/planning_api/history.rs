use super::*;

use crate::domain::ledger::LedgerPage;

impl TeamPlanningSession {
    // ==========================================
    // 台账查询（只读，新到旧，页码从 0 开始）
    // ==========================================

    /// 远端再平衡历史
    pub async fn history(&self, page: u32) -> ApiResult<LedgerPage> {
        let page_size = self.config.history_page_size;
        Ok(self.service.fetch_history(&self.team_id, page, page_size).await?)
    }

    /// 本地台账（本机提交记录）
    pub fn local_history(&self, page: u32) -> ApiResult<LedgerPage> {
        let repo = self
            .ledger_repo
            .as_ref()
            .ok_or_else(|| ApiError::Internal("未配置本地台账".to_string()))?;

        let page_size = self.config.history_page_size;
        let offset = page.saturating_mul(page_size);
        let entries = repo.list_by_team(&self.team_id, page_size, offset)?;
        let total = repo.count_by_team(&self.team_id)?;

        Ok(LedgerPage {
            entries,
            page,
            page_size,
            total,
        })
    }
}
