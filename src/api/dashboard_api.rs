// ==========================================
// 车间生产执行跟踪系统 - 现场看板 API
// ==========================================
// 职责: 聚合每台机台的实时状态（当前任务/操作工/工单）
// 说明: 以机台绑定指针为入口做关联查询，绑定缺失时对应字段为空
// ==========================================

use std::sync::Arc;

use serde::Serialize;

use crate::api::auth_api::CurrentUser;
use crate::api::error::ApiResult;
use crate::domain::machine::Machine;
use crate::domain::task::Task;
use crate::domain::user::{PublicUser, User};
use crate::domain::work_order::WorkOrder;
use crate::repository::{MachineRepository, TaskRepository, UserRepository, WorkOrderRepository};

// ==========================================
// 响应结构
// ==========================================

/// 单台机台的实时状态
#[derive(Debug, Clone, Serialize)]
pub struct MachineLiveStatus {
    pub machine: Machine,
    pub task: Option<Task>,
    pub worker: Option<PublicUser>,
    pub work_order: Option<WorkOrder>,
}

// ==========================================
// DashboardApi - 现场看板 API
// ==========================================
pub struct DashboardApi {
    machine_repo: Arc<MachineRepository>,
    task_repo: Arc<TaskRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
    user_repo: Arc<UserRepository>,
}

impl DashboardApi {
    /// 创建新的现场看板 API 实例
    pub fn new(
        machine_repo: Arc<MachineRepository>,
        task_repo: Arc<TaskRepository>,
        work_order_repo: Arc<WorkOrderRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            machine_repo,
            task_repo,
            work_order_repo,
            user_repo,
        }
    }

    /// 查询全部机台的实时状态（任意角色）
    pub fn live_status(&self, _current: &CurrentUser) -> ApiResult<Vec<MachineLiveStatus>> {
        let machines = self.machine_repo.list()?;
        // 只关联进行中的任务，已完结任务不出现在看板上
        let active_tasks = self.task_repo.find_active()?;

        let mut statuses = Vec::with_capacity(machines.len());
        for machine in machines {
            let task = machine
                .current_task_id
                .as_ref()
                .and_then(|task_id| active_tasks.iter().find(|t| &t.id == task_id).cloned());

            let (work_order, worker) = match &task {
                Some(task) => {
                    let work_order = self.work_order_repo.find_by_id(&task.work_order_id)?;
                    let worker = match &machine.current_worker_id {
                        Some(worker_id) => self
                            .user_repo
                            .find_by_id(worker_id)?
                            .as_ref()
                            .map(User::to_public),
                        None => None,
                    };
                    (work_order, worker)
                }
                None => (None, None),
            };

            statuses.push(MachineLiveStatus {
                machine,
                task,
                worker,
                work_order,
            });
        }

        Ok(statuses)
    }
}
