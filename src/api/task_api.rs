// ==========================================
// 车间生产执行跟踪系统 - 任务管理 API
// ==========================================
// 职责: 任务分派/领取/查询/撤回
// 说明: 分派与撤回涉及工单/机台级联，委托给状态引擎在事务内完成
// ==========================================

use std::sync::Arc;

use serde::Deserialize;

use crate::api::auth_api::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::task::Task;
use crate::domain::types::UserRole;
use crate::engine::StatusEngine;
use crate::i18n::t;
use crate::repository::{MachineRepository, TaskRepository, WorkOrderRepository};

// ==========================================
// 请求结构
// ==========================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub work_order_id: String,
    pub machine_id: String,
    pub quantity_assigned: i64,
}

// ==========================================
// TaskApi - 任务管理 API
// ==========================================
pub struct TaskApi {
    task_repo: Arc<TaskRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
    machine_repo: Arc<MachineRepository>,
    status_engine: Arc<StatusEngine>,
}

impl TaskApi {
    /// 创建新的任务管理 API 实例
    pub fn new(
        task_repo: Arc<TaskRepository>,
        work_order_repo: Arc<WorkOrderRepository>,
        machine_repo: Arc<MachineRepository>,
        status_engine: Arc<StatusEngine>,
    ) -> Self {
        Self {
            task_repo,
            work_order_repo,
            machine_repo,
            status_engine,
        }
    }

    /// 查询全部任务（任意角色）
    pub fn list(&self, _current: &CurrentUser) -> ApiResult<Vec<Task>> {
        Ok(self.task_repo.list()?)
    }

    /// 分派任务（管理员或班组长）
    ///
    /// 校验工单/机台存在后，由状态引擎插入任务并将工单置为 assigned
    pub fn create(&self, current: &CurrentUser, request: CreateTaskRequest) -> ApiResult<Task> {
        current.require_supervisor()?;

        if request.quantity_assigned <= 0 {
            return Err(ApiError::InvalidInput("分派数量必须大于0".to_string()));
        }

        if self
            .work_order_repo
            .find_by_id(&request.work_order_id)?
            .is_none()
        {
            return Err(ApiError::NotFound(format!(
                "工单不存在: {}",
                request.work_order_id
            )));
        }

        if self.machine_repo.find_by_id(&request.machine_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "机台不存在: {}",
                request.machine_id
            )));
        }

        let task = Task::new(
            request.work_order_id,
            request.machine_id,
            current.id.clone(),
            request.quantity_assigned,
        );
        self.status_engine.assign_task(&task)?;

        tracing::info!(
            task_id = %task.id,
            work_order_id = %task.work_order_id,
            machine_id = %task.machine_id,
            "任务已分派"
        );
        Ok(task)
    }

    /// 领取任务: 绑定操作工到任务
    pub fn claim_worker(
        &self,
        _current: &CurrentUser,
        task_id: &str,
        worker_id: &str,
    ) -> ApiResult<String> {
        if !self.task_repo.set_assigned_worker(task_id, worker_id)? {
            return Err(ApiError::NotFound(format!("任务不存在: {}", task_id)));
        }
        tracing::info!(task_id, worker_id, "任务已领取");
        Ok(t("task.claimed"))
    }

    /// 查询操作工名下未完结的任务
    ///
    /// 操作工只能查询自己；管理员/班组长可查询任意操作工
    pub fn list_worker_tasks(
        &self,
        current: &CurrentUser,
        worker_id: &str,
    ) -> ApiResult<Vec<Task>> {
        if current.role == UserRole::Worker && current.id != worker_id {
            return Err(ApiError::Forbidden(
                "操作工只能查询自己的任务".to_string(),
            ));
        }
        Ok(self.task_repo.find_open_by_worker(worker_id)?)
    }

    /// 撤回任务（管理员或班组长）
    ///
    /// 删除任务并将其机台复位为空闲、清空全部绑定
    pub fn retract(&self, current: &CurrentUser, task_id: &str) -> ApiResult<String> {
        current.require_supervisor()?;

        let task = self.status_engine.retract_task(task_id)?;

        tracing::info!(task_id = %task.id, machine_id = %task.machine_id, "任务已撤回");
        Ok(t("task.retracted"))
    }
}
