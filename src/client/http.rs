// ==========================================
// 团队产能规划 - HTTP 产能服务客户端
// ==========================================
// 说明:
// - 查询类请求（GET）对瞬时错误做指数退避重试
// - 变更类请求（改派、提交、产能调整）不自动重试，由用户决定是否重新提交
// ==========================================

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{is_retryable_status, ServiceError, ServiceResult};
use super::{ApplyResponse, CapacityService};
use crate::config::ServiceConfig;
use crate::domain::capacity::{AdjustmentResult, CapacityAdjustment, Reassignment};
use crate::domain::ledger::LedgerPage;
use crate::domain::member::CapacitySnapshot;
use crate::domain::plan::{AnalysisBundle, SubmissionPayload};

/// HTTP 产能服务
pub struct HttpCapacityService {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl HttpCapacityService {
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    /// GET + 瞬时错误重试
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ServiceResult<T> {
        let url = self.url(path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.initial_backoff_ms * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, url = %url, "get_json: 瞬时错误，退避后重试");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self.authorize(self.http.get(&url).query(query)).send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "get_json: 网络错误");
                    last_error = Some(ServiceError::from(e));
                    continue;
                }
            };

            let status = response.status().as_u16();
            if is_retryable_status(status) && attempt < self.max_retries {
                let text = response.text().await.unwrap_or_default();
                last_error = Some(ServiceError::Server { status, message: text });
                continue;
            }

            return decode(response).await;
        }

        Err(last_error.unwrap_or_else(|| ServiceError::Transport("超过最大重试次数".to_string())))
    }

    /// POST（不重试）
    async fn post_json<B, T>(&self, path: &str, body: &B) -> ServiceResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .authorize(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Server {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

fn sprint_query(sprint_id: Option<&str>) -> Vec<(&'static str, String)> {
    sprint_id
        .map(|s| vec![("sprintId", s.to_string())])
        .unwrap_or_default()
}

#[async_trait]
impl CapacityService for HttpCapacityService {
    async fn fetch_capacity_snapshot(
        &self,
        team_id: &str,
        sprint_id: Option<&str>,
    ) -> ServiceResult<CapacitySnapshot> {
        self.get_json(&format!("/teams/{}/capacity", team_id), &sprint_query(sprint_id))
            .await
    }

    async fn fetch_rebalance_analysis(
        &self,
        team_id: &str,
        sprint_id: Option<&str>,
    ) -> ServiceResult<AnalysisBundle> {
        self.get_json(
            &format!("/teams/{}/capacity/rebalance-analysis", team_id),
            &sprint_query(sprint_id),
        )
        .await
    }

    async fn reassign_work_item(
        &self,
        work_item_id: &str,
        target_member_id: &str,
    ) -> ServiceResult<Reassignment> {
        let body = serde_json::json!({ "assigneeId": target_member_id });
        match self
            .post_json(&format!("/tasks/{}/reassign", work_item_id), &body)
            .await
        {
            // 4xx 视为单项拒绝（如负责人已在方案外变更）
            Err(ServiceError::Server { status, message }) if (400..500).contains(&status) => {
                Err(ServiceError::ItemRejected {
                    work_item_id: work_item_id.to_string(),
                    reason: message,
                })
            }
            other => other,
        }
    }

    async fn apply_plan(&self, team_id: &str, payload: &SubmissionPayload) -> ServiceResult<ApplyResponse> {
        self.post_json(&format!("/teams/{}/capacity/rebalance/apply", team_id), payload)
            .await
    }

    async fn fetch_history(&self, team_id: &str, page: u32, page_size: u32) -> ServiceResult<LedgerPage> {
        self.get_json(
            &format!("/teams/{}/capacity/rebalance/history", team_id),
            &[("page", page.to_string()), ("limit", page_size.to_string())],
        )
        .await
    }

    async fn add_capacity_adjustment(
        &self,
        team_id: &str,
        adjustment: &CapacityAdjustment,
    ) -> ServiceResult<AdjustmentResult> {
        self.post_json(&format!("/teams/{}/capacity/adjustments", team_id), adjustment)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let config = ServiceConfig {
            base_url: "http://localhost:5000/api/".to_string(),
            ..ServiceConfig::default()
        };
        let service = HttpCapacityService::from_config(&config).unwrap();
        assert_eq!(service.url("/teams/t1/capacity"), "http://localhost:5000/api/teams/t1/capacity");
    }

    #[test]
    fn test_sprint_query() {
        assert!(sprint_query(None).is_empty());
        assert_eq!(sprint_query(Some("S1")), vec![("sprintId", "S1".to_string())]);
    }
}
