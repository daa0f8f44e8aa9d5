// ==========================================
// 车间生产执行跟踪系统 - 机台领域模型
// ==========================================
// 用途: 物理工位。绑定指针由状态引擎维护
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::MachineStatus;

// ==========================================
// Machine - 机台
// ==========================================
// 不变量: current_task_id / current_worker_id / current_work_order_id
//         要么全部设置，要么全部为空
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,                           // 机台ID (UUID)
    pub name: String,                         // 机台名称
    pub code: String,                         // 机台代码 (唯一)
    pub status: MachineStatus,                // 机台状态
    pub current_work_order_id: Option<String>, // 当前工单ID
    pub current_worker_id: Option<String>,    // 当前操作工ID
    pub current_task_id: Option<String>,      // 当前任务ID
    pub created_at: DateTime<Utc>,            // 创建时间
}

impl Machine {
    /// 创建新机台（初始状态 idle，无绑定）
    pub fn new(name: String, code: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            code,
            status: MachineStatus::Idle,
            current_work_order_id: None,
            current_worker_id: None,
            current_task_id: None,
            created_at: Utc::now(),
        }
    }

    /// 绑定是否满足全有或全无的约束
    pub fn binding_is_consistent(&self) -> bool {
        let set = [
            self.current_work_order_id.is_some(),
            self.current_worker_id.is_some(),
            self.current_task_id.is_some(),
        ];
        set.iter().all(|s| *s) || set.iter().all(|s| !*s)
    }
}
