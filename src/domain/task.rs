// ==========================================
// 车间生产执行跟踪系统 - 任务领域模型
// ==========================================
// 用途: 工单数量到机台的分派。状态/完成数量只由状态引擎写入
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::TaskStatus;

// ==========================================
// Task - 任务
// ==========================================
// 不变量: 完成后 quantity_completed <= quantity_assigned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,                         // 任务ID (UUID)
    pub work_order_id: String,              // 工单ID
    pub machine_id: String,                 // 机台ID
    pub assigned_worker_id: Option<String>, // 领取的操作工ID
    pub assigned_by: String,                // 分派人ID
    pub status: TaskStatus,                 // 任务状态
    pub quantity_assigned: i64,             // 分派数量
    pub quantity_completed: i64,            // 完成数量
    pub assigned_at: DateTime<Utc>,         // 分派时间
}

impl Task {
    /// 创建新任务（初始状态 assigned，未绑定操作工）
    pub fn new(
        work_order_id: String,
        machine_id: String,
        assigned_by: String,
        quantity_assigned: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            work_order_id,
            machine_id,
            assigned_worker_id: None,
            assigned_by,
            status: TaskStatus::Assigned,
            quantity_assigned,
            quantity_completed: 0,
            assigned_at: Utc::now(),
        }
    }

    /// 派生余量任务（部分完成时状态引擎调用）
    ///
    /// 余量任务复用原任务的工单/机台/分派人，不绑定操作工
    pub fn spawn_remainder(&self, remaining: i64) -> Self {
        Task::new(
            self.work_order_id.clone(),
            self.machine_id.clone(),
            self.assigned_by.clone(),
            remaining,
        )
    }
}
