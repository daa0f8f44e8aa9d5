// ==========================================
// 车间生产执行跟踪系统 - 领域类型定义
// ==========================================
// 序列化格式: snake_case (与数据库/前端一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 用户角色 (User Role)
// ==========================================
// 角色决定授权范围: admin > supervisor > worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,      // 管理员
    Supervisor, // 班组长
    Worker,     // 操作工
}

impl UserRole {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Supervisor => "supervisor",
            UserRole::Worker => "worker",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "supervisor" => Some(UserRole::Supervisor),
            "worker" => Some(UserRole::Worker),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 机台状态 (Machine Status)
// ==========================================
// 状态/绑定只能由状态引擎写入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Idle,    // 空闲
    Running, // 运行中
    Stopped, // 停机
    Pause,   // 暂停
}

impl MachineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Idle => "idle",
            MachineStatus::Running => "running",
            MachineStatus::Stopped => "stopped",
            MachineStatus::Pause => "pause",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(MachineStatus::Idle),
            "running" => Some(MachineStatus::Running),
            "stopped" => Some(MachineStatus::Stopped),
            "pause" => Some(MachineStatus::Pause),
            _ => None,
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 状态只能由状态引擎写入，不可由用户直接设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,    // 待分配
    Assigned,   // 已分配
    InProgress, // 生产中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::Assigned => "assigned",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WorkOrderStatus::Pending),
            "assigned" => Some(WorkOrderStatus::Assigned),
            "in_progress" => Some(WorkOrderStatus::InProgress),
            "completed" => Some(WorkOrderStatus::Completed),
            "cancelled" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 任务状态 (Task Status)
// ==========================================
// completed/cancelled 为终态: 终态任务不再接受事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,    // 已分配
    Preparation, // 准备中
    InProgress,  // 生产中
    Paused,      // 已暂停
    Completed,   // 已完成
    Cancelled,   // 已取消
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "assigned",
            TaskStatus::Preparation => "preparation",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assigned" => Some(TaskStatus::Assigned),
            "preparation" => Some(TaskStatus::Preparation),
            "in_progress" => Some(TaskStatus::InProgress),
            "paused" => Some(TaskStatus::Paused),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// 是否为终态（终态任务除历史读取外不可变）
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// 是否为进行中状态（现场看板展示用）
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Preparation | TaskStatus::InProgress | TaskStatus::Paused
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工作日志事件类型 (Work Log Event Type)
// ==========================================
// 工作日志为追加式事件流，是时间重建的唯一事实来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkLogEventType {
    PrepStart,    // 准备开始
    PrepEnd,      // 准备结束
    WorkStart,    // 生产开始
    WorkPause,    // 生产暂停
    WorkResume,   // 生产恢复
    WorkComplete, // 生产完成
}

impl WorkLogEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLogEventType::PrepStart => "prep_start",
            WorkLogEventType::PrepEnd => "prep_end",
            WorkLogEventType::WorkStart => "work_start",
            WorkLogEventType::WorkPause => "work_pause",
            WorkLogEventType::WorkResume => "work_resume",
            WorkLogEventType::WorkComplete => "work_complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prep_start" => Some(WorkLogEventType::PrepStart),
            "prep_end" => Some(WorkLogEventType::PrepEnd),
            "work_start" => Some(WorkLogEventType::WorkStart),
            "work_pause" => Some(WorkLogEventType::WorkPause),
            "work_resume" => Some(WorkLogEventType::WorkResume),
            "work_complete" => Some(WorkLogEventType::WorkComplete),
            _ => None,
        }
    }
}

impl fmt::Display for WorkLogEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 暂停原因 (Pause Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    Break,            // 工间休息
    Failure,          // 设备故障
    MaterialShortage, // 缺料
    Toilet,           // 如厕
    Prayer,           // 祈祷
    Meal,             // 用餐
}

impl PauseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseReason::Break => "break",
            PauseReason::Failure => "failure",
            PauseReason::MaterialShortage => "material_shortage",
            PauseReason::Toilet => "toilet",
            PauseReason::Prayer => "prayer",
            PauseReason::Meal => "meal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "break" => Some(PauseReason::Break),
            "failure" => Some(PauseReason::Failure),
            "material_shortage" => Some(PauseReason::MaterialShortage),
            "toilet" => Some(PauseReason::Toilet),
            "prayer" => Some(PauseReason::Prayer),
            "meal" => Some(PauseReason::Meal),
            _ => None,
        }
    }

    /// 全部暂停原因（报表分桶用）
    pub fn all() -> [PauseReason; 6] {
        [
            PauseReason::Break,
            PauseReason::Failure,
            PauseReason::MaterialShortage,
            PauseReason::Toilet,
            PauseReason::Prayer,
            PauseReason::Meal,
        ]
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
