// ==========================================
// 车间生产执行跟踪系统 - 应用层
// ==========================================
// 职责: 装配共享状态，供外层传输适配器使用
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState, SharedConnection};
