// ==========================================
// 车间生产执行跟踪系统 - 工作日志领域模型
// ==========================================
// 红线: 追加式事件流，创建后不可修改、不可删除
// 用途: 任务状态推导的输入 + 时间重建的唯一事实来源
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{PauseReason, WorkLogEventType};

// ==========================================
// WorkLog - 工作日志事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: String,                      // 日志ID (UUID)
    pub task_id: String,                 // 任务ID
    pub worker_id: String,               // 操作工ID (由调用者身份推导)
    pub machine_id: String,              // 机台ID (由任务推导)
    pub event_type: WorkLogEventType,    // 事件类型
    pub timestamp: DateTime<Utc>,        // 事件时间戳
    pub pause_reason: Option<PauseReason>, // 暂停原因 (仅 work_pause 有意义)
    pub quantity_completed: Option<i64>, // 完成数量 (仅 work_complete 有意义)
    pub notes: Option<String>,           // 备注
}

impl WorkLog {
    /// 创建新的工作日志事件
    pub fn new(
        task_id: String,
        worker_id: String,
        machine_id: String,
        event_type: WorkLogEventType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            worker_id,
            machine_id,
            event_type,
            timestamp: Utc::now(),
            pause_reason: None,
            quantity_completed: None,
            notes: None,
        }
    }

    /// 设置暂停原因
    pub fn with_pause_reason(mut self, reason: Option<PauseReason>) -> Self {
        self.pause_reason = reason;
        self
    }

    /// 设置完成数量
    pub fn with_quantity_completed(mut self, quantity: Option<i64>) -> Self {
        self.quantity_completed = quantity;
        self
    }

    /// 设置备注
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}
