// ==========================================
// 车间生产执行跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 全部 Repository/Engine/API 共享同一条互斥保护的连接，
//       使一个事件的级联写入天然串行
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{
    AuthApi, DashboardApi, MachineApi, ReportApi, TaskApi, UserApi, WorkLogApi, WorkOrderApi,
};
use crate::config::ConfigManager;
use crate::engine::StatusEngine;
use crate::repository::{
    MachineRepository, SessionRepository, TaskRepository, UserRepository, WorkLogRepository,
    WorkOrderRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 认证API
    pub auth_api: Arc<AuthApi>,

    /// 用户管理API
    pub user_api: Arc<UserApi>,

    /// 机台管理API
    pub machine_api: Arc<MachineApi>,

    /// 工单管理API
    pub work_order_api: Arc<WorkOrderApi>,

    /// 任务管理API
    pub task_api: Arc<TaskApi>,

    /// 工作日志API
    pub work_log_api: Arc<WorkLogApi>,

    /// 现场看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 报表API
    pub report_api: Arc<ReportApi>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并应用统一 PRAGMA
    /// 2. 初始化所有Repository（各自确保表结构存在）
    /// 3. 初始化状态引擎
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        if let Err(e) = crate::db::stamp_schema_version(&conn) {
            tracing::warn!("schema_version 写入失败(将继续启动): {}", e);
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let user_repo = Arc::new(
            UserRepository::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 UserRepository 失败: {}", e))?,
        );
        let machine_repo = Arc::new(
            MachineRepository::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 MachineRepository 失败: {}", e))?,
        );
        let work_order_repo = Arc::new(
            WorkOrderRepository::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 WorkOrderRepository 失败: {}", e))?,
        );
        let task_repo = Arc::new(
            TaskRepository::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 TaskRepository 失败: {}", e))?,
        );
        let work_log_repo = Arc::new(
            WorkLogRepository::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 WorkLogRepository 失败: {}", e))?,
        );
        let session_repo = Arc::new(
            SessionRepository::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 SessionRepository 失败: {}", e))?,
        );

        // ==========================================
        // 初始化配置与引擎
        // ==========================================
        let config = Arc::new(
            ConfigManager::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("初始化 ConfigManager 失败: {}", e))?,
        );
        let status_engine = Arc::new(StatusEngine::new(Arc::clone(&conn)));

        // ==========================================
        // 创建API实例
        // ==========================================
        let auth_api = Arc::new(AuthApi::new(
            Arc::clone(&user_repo),
            Arc::clone(&session_repo),
            Arc::clone(&config),
        ));
        let user_api = Arc::new(UserApi::new(Arc::clone(&user_repo)));
        let machine_api = Arc::new(MachineApi::new(Arc::clone(&machine_repo)));
        let work_order_api = Arc::new(WorkOrderApi::new(Arc::clone(&work_order_repo)));
        let task_api = Arc::new(TaskApi::new(
            Arc::clone(&task_repo),
            Arc::clone(&work_order_repo),
            Arc::clone(&machine_repo),
            Arc::clone(&status_engine),
        ));
        let work_log_api = Arc::new(WorkLogApi::new(
            Arc::clone(&status_engine),
            Arc::clone(&work_log_repo),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            Arc::clone(&machine_repo),
            Arc::clone(&task_repo),
            Arc::clone(&work_order_repo),
            Arc::clone(&user_repo),
        ));
        let report_api = Arc::new(ReportApi::new(
            Arc::clone(&work_log_repo),
            Arc::clone(&user_repo),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            auth_api,
            user_api,
            machine_api,
            work_order_api,
            task_api,
            work_log_api,
            dashboard_api,
            report_api,
            config,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 SHOPFLOOR_MES_DB
/// 2. 系统数据目录下 shopfloor-mes/shopfloor_mes.db
/// 3. 当前目录 shopfloor_mes.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("SHOPFLOOR_MES_DB") {
        return path;
    }

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("shopfloor-mes");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir.join("shopfloor_mes.db").to_string_lossy().to_string();
        }
    }

    "shopfloor_mes.db".to_string()
}

// 用到共享连接类型的别名，便于测试代码引用
pub type SharedConnection = Arc<Mutex<Connection>>;
