// ==========================================
// 车间生产执行跟踪系统 - 工单领域模型
// ==========================================
// 用途: 生产请求。状态只由状态引擎推导
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::WorkOrderStatus;

// ==========================================
// WorkOrder - 工单
// ==========================================
// order_no 约定唯一（不强制约束）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,                 // 工单ID (UUID)
    pub order_no: String,           // 工单号
    pub part_name: String,          // 零件名称
    pub quantity: i64,              // 计划数量
    pub description: Option<String>, // 备注
    pub status: WorkOrderStatus,    // 工单状态
    pub created_at: DateTime<Utc>,  // 创建时间
    pub created_by: String,         // 创建人ID
}

impl WorkOrder {
    /// 创建新工单（初始状态 pending）
    pub fn new(
        order_no: String,
        part_name: String,
        quantity: i64,
        description: Option<String>,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_no,
            part_name,
            quantity,
            description,
            status: WorkOrderStatus::Pending,
            created_at: Utc::now(),
            created_by,
        }
    }
}
