// ==========================================
// 车间生产执行跟踪系统 - API 层
// ==========================================
// 职责: 角色门禁 + 请求校验 + 委托引擎/仓储
// 说明: 本层以普通结构体暴露业务接口，由外层传输适配器
//       (HTTP 等) 负责令牌提取与状态码映射
// ==========================================

pub mod auth_api;
pub mod dashboard_api;
pub mod error;
pub mod machine_api;
pub mod report_api;
pub mod task_api;
pub mod user_api;
pub mod work_log_api;
pub mod work_order_api;

// 重导出核心 API
pub use auth_api::{AuthApi, CurrentUser, LoginRequest, LoginResponse};
pub use dashboard_api::{DashboardApi, MachineLiveStatus};
pub use error::{ApiError, ApiResult};
pub use machine_api::{CreateMachineRequest, MachineApi, UpdateMachineRequest};
pub use report_api::{DailyReport, RangeReport, ReportApi, WorkerPerformanceReport};
pub use task_api::{CreateTaskRequest, TaskApi};
pub use user_api::{CreateUserRequest, UpdateUserRequest, UserApi};
pub use work_log_api::{CreateWorkLogRequest, WorkLogApi};
pub use work_order_api::{CreateWorkOrderRequest, WorkOrderApi};
