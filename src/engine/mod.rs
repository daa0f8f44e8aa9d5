// ==========================================
// 车间生产执行跟踪系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎
// 红线: 所有状态列只由引擎写入; 先算后写，级联写入走同一事务
// ==========================================

pub mod report;
pub mod status;
pub mod time_reconstruction;

// 重导出核心引擎
pub use report::{
    daily_window, range_window, LogWindowSummary, PauseBreakdown, ReportEngine,
    WorkerPerformanceSummary,
};
pub use status::{
    plan_transition, MachineChange, NewWorkLogEvent, StatusEngine, TaskChange, TransitionPlan,
    WorkOrderChange,
};
pub use time_reconstruction::{TimeReconstructionEngine, WorkerTimeSummary};
