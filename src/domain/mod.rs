// ==========================================
// 车间生产执行跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod machine;
pub mod task;
pub mod types;
pub mod user;
pub mod work_log;
pub mod work_order;

// 重导出核心类型
pub use machine::Machine;
pub use task::Task;
pub use types::{
    MachineStatus, PauseReason, TaskStatus, UserRole, WorkLogEventType, WorkOrderStatus,
};
pub use user::{PublicUser, User};
pub use work_log::WorkLog;
pub use work_order::WorkOrder;
