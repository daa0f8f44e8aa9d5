// ==========================================
// 车间生产执行跟踪系统 - 工单管理 API
// ==========================================
// 职责: 工单创建/查询/删除（写操作需管理员或班组长）
// 红线: 工单状态不可由用户直接设置，只由状态引擎推导
// ==========================================

use std::sync::Arc;

use serde::Deserialize;

use crate::api::auth_api::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::work_order::WorkOrder;
use crate::i18n::t;
use crate::repository::WorkOrderRepository;

// ==========================================
// 请求结构
// ==========================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub order_no: String,
    pub part_name: String,
    pub quantity: i64,
    pub description: Option<String>,
}

// ==========================================
// WorkOrderApi - 工单管理 API
// ==========================================
pub struct WorkOrderApi {
    work_order_repo: Arc<WorkOrderRepository>,
}

impl WorkOrderApi {
    /// 创建新的工单管理 API 实例
    pub fn new(work_order_repo: Arc<WorkOrderRepository>) -> Self {
        Self { work_order_repo }
    }

    /// 查询全部工单（任意角色）
    pub fn list(&self, _current: &CurrentUser) -> ApiResult<Vec<WorkOrder>> {
        Ok(self.work_order_repo.list()?)
    }

    /// 创建工单（管理员或班组长，初始状态 pending）
    pub fn create(
        &self,
        current: &CurrentUser,
        request: CreateWorkOrderRequest,
    ) -> ApiResult<WorkOrder> {
        current.require_supervisor()?;

        if request.order_no.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单号不能为空".to_string()));
        }
        if request.quantity <= 0 {
            return Err(ApiError::InvalidInput("计划数量必须大于0".to_string()));
        }

        let order = WorkOrder::new(
            request.order_no,
            request.part_name,
            request.quantity,
            request.description,
            current.id.clone(),
        );
        self.work_order_repo.insert(&order)?;

        tracing::info!(order_id = %order.id, order_no = %order.order_no, "工单已创建");
        Ok(order)
    }

    /// 删除工单（管理员或班组长）
    pub fn delete(&self, current: &CurrentUser, order_id: &str) -> ApiResult<String> {
        current.require_supervisor()?;

        if !self.work_order_repo.delete(order_id)? {
            return Err(ApiError::NotFound(format!("工单不存在: {}", order_id)));
        }

        tracing::info!(order_id, "工单已删除");
        Ok(t("work_order.deleted"))
    }
}
