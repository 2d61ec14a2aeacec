// ==========================================
// 团队产能规划 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::PlanningApi;
use crate::client::{CapacityService, HttpCapacityService};
use crate::config::{ConfigManager, PlannerConfig, ServiceConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{BroadcastEventPublisher, CapacityEventPublisher};
use crate::repository::LedgerRepository;

/// 事件通道容量
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 规划会话API
    pub planning_api: Arc<PlanningApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 本地台账仓储（用于审计追踪）
    pub ledger_repo: Arc<LedgerRepository>,

    /// 失效事件发布器（渲染层订阅后决定如何刷新）
    pub event_publisher: Arc<BroadcastEventPublisher>,
}

impl AppState {
    /// 创建新的AppState实例（使用 HTTP 产能服务）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - service_config: 外部服务连接参数
    pub fn new(db_path: String, service_config: &ServiceConfig) -> Result<Self, String> {
        let service = HttpCapacityService::from_config(service_config)
            .map_err(|e| format!("无法创建产能服务客户端: {}", e))?;
        Self::with_service(db_path, Arc::new(service))
    }

    /// 使用指定的产能服务创建AppState
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并初始化表结构
    /// 2. 从 config_kv 加载规划参数
    /// 3. 创建规划API
    pub fn with_service(db_path: String, service: Arc<dyn CapacityService>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone()).map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let planner_config = config_manager.load_planner_config().unwrap_or_else(|e| {
            tracing::warn!("规划参数加载失败，使用默认值: {}", e);
            PlannerConfig::default()
        });

        let ledger_repo = Arc::new(LedgerRepository::new(conn));
        let event_publisher = Arc::new(BroadcastEventPublisher::new(EVENT_CHANNEL_CAPACITY));

        let planning_api = Arc::new(PlanningApi::new(
            service,
            Some(ledger_repo.clone()),
            planner_config,
            Some(event_publisher.clone() as Arc<dyn CapacityEventPublisher>),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            planning_api,
            config_manager,
            ledger_repo,
            event_publisher,
        })
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("CAPACITY_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./capacity_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("capacity-planner-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("capacity-planner");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("capacity_planner.db");
    }

    path.to_string_lossy().to_string()
}
