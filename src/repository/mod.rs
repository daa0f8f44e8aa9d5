// ==========================================
// 车间生产执行跟踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod machine_repo;
pub mod session_repo;
pub mod task_repo;
pub mod user_repo;
pub mod work_log_repo;
pub mod work_order_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use machine_repo::MachineRepository;
pub use session_repo::{Session, SessionRepository};
pub use task_repo::TaskRepository;
pub use user_repo::UserRepository;
pub use work_log_repo::WorkLogRepository;
pub use work_order_repo::WorkOrderRepository;

/// 实体查询的统一分页上限
pub const ENTITY_PAGE_LIMIT: i64 = 1_000;

/// 日志查询的统一分页上限
pub const LOG_PAGE_LIMIT: i64 = 10_000;

/// 列值解析失败时的统一错误（用于 map_row 闭包内）
pub(crate) fn column_parse_error(idx: usize, value: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("无法解析{}: {}", what, value).into(),
    )
}
