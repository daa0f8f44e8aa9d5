// ==========================================
// 车间生产执行跟踪系统 - 状态引擎
// ==========================================
// 职责: 接收任务的工作日志事件，推导并级联应用
//       任务状态 / 工单状态 / 机台状态与绑定
// 说明: 转换决策由纯函数 plan_transition 产出（先算后写），
//       一个事件的全部写入在同一事务内完成
// 红线: 任务/工单/机台的状态列只允许本引擎写入
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::instrument;

use crate::domain::task::Task;
use crate::domain::types::{MachineStatus, TaskStatus, WorkLogEventType, WorkOrderStatus};
use crate::domain::work_log::WorkLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    MachineRepository, TaskRepository, WorkLogRepository, WorkOrderRepository,
};

// ==========================================
// 事件输入
// ==========================================

/// 工作日志事件输入（worker_id / machine_id 由调用方身份与任务推导）
#[derive(Debug, Clone)]
pub struct NewWorkLogEvent {
    pub task_id: String,
    pub event_type: WorkLogEventType,
    pub pause_reason: Option<crate::domain::types::PauseReason>,
    pub quantity_completed: Option<i64>,
    pub notes: Option<String>,
}

// ==========================================
// 转换计划（纯值）
// ==========================================

/// 任务侧变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskChange {
    /// 仅更新状态
    Status(TaskStatus),
    /// 完成: 写入状态 completed + 完成数量
    Complete { quantity: i64 },
}

/// 工单侧变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrderChange {
    /// 不变
    Unchanged,
    /// 置为生产中
    InProgress,
    /// 若工单下全部任务（含刚派生的余量任务）均已完成，则置为已完成
    CompleteIfAllTasksDone,
}

/// 机台侧变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineChange {
    /// 置为运行中（不触碰绑定）
    Running,
    /// 置为运行中并写入三个绑定指针
    RunningWithBinding,
    /// 置为暂停（不触碰绑定）
    Pause,
    /// 置为空闲并清空三个绑定指针
    IdleCleared,
}

/// 一个事件推导出的全部状态变化（先算后写）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub task: TaskChange,
    /// 部分完成时派生的余量任务数量
    pub remainder_quantity: Option<i64>,
    pub work_order: WorkOrderChange,
    pub machine: MachineChange,
}

/// 由任务当前快照 + 事件推导转换计划（纯函数，不访问存储）
///
/// 转换表:
///
/// | 事件          | 任务        | 工单                  | 机台            |
/// |---------------|-------------|-----------------------|-----------------|
/// | prep_start    | preparation | 不变                  | running + 绑定  |
/// | prep_end      | in_progress | in_progress           | running         |
/// | work_start    | in_progress | in_progress           | running         |
/// | work_pause    | paused      | 不变                  | pause           |
/// | work_resume   | in_progress | 不变                  | running         |
/// | work_complete | completed   | 全部任务完成则 completed | idle + 清绑定 |
pub fn plan_transition(task: &Task, event_type: WorkLogEventType, quantity_completed: Option<i64>) -> TransitionPlan {
    match event_type {
        WorkLogEventType::PrepStart => TransitionPlan {
            task: TaskChange::Status(TaskStatus::Preparation),
            remainder_quantity: None,
            work_order: WorkOrderChange::Unchanged,
            machine: MachineChange::RunningWithBinding,
        },
        WorkLogEventType::PrepEnd | WorkLogEventType::WorkStart => TransitionPlan {
            task: TaskChange::Status(TaskStatus::InProgress),
            remainder_quantity: None,
            work_order: WorkOrderChange::InProgress,
            machine: MachineChange::Running,
        },
        WorkLogEventType::WorkPause => TransitionPlan {
            task: TaskChange::Status(TaskStatus::Paused),
            remainder_quantity: None,
            work_order: WorkOrderChange::Unchanged,
            machine: MachineChange::Pause,
        },
        WorkLogEventType::WorkResume => TransitionPlan {
            task: TaskChange::Status(TaskStatus::InProgress),
            remainder_quantity: None,
            work_order: WorkOrderChange::Unchanged,
            machine: MachineChange::Running,
        },
        WorkLogEventType::WorkComplete => {
            let quantity = quantity_completed.unwrap_or(0);
            let remaining = task.quantity_assigned - quantity;
            TransitionPlan {
                task: TaskChange::Complete { quantity },
                remainder_quantity: (remaining > 0).then_some(remaining),
                work_order: WorkOrderChange::CompleteIfAllTasksDone,
                machine: MachineChange::IdleCleared,
            }
        }
    }
}

// ==========================================
// StatusEngine - 状态引擎
// ==========================================
pub struct StatusEngine {
    conn: Arc<Mutex<Connection>>,
}

impl StatusEngine {
    /// 创建新的状态引擎
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 应用一个工作日志事件并级联更新任务/工单/机台
    ///
    /// # 参数
    /// - worker_id: 提交事件的操作工（由调用方身份解析）
    /// - event: 事件输入
    ///
    /// # 返回
    /// - Ok(WorkLog): 已持久化的日志记录
    /// - Err(NotFound): 任务不存在（无任何副作用）
    /// - Err(InvalidStateTransition): 任务已处于终态（重复完成等被拒绝）
    ///
    /// # 一致性
    /// 日志插入与全部级联写入在同一事务内提交，
    /// 共享连接互斥锁保证同一任务的事件串行生效
    #[instrument(skip(self, event), fields(task_id = %event.task_id, event_type = %event.event_type))]
    pub fn apply_work_log_event(
        &self,
        worker_id: &str,
        event: NewWorkLogEvent,
    ) -> RepositoryResult<WorkLog> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 应用前必须取任务的最新快照
        let task = TaskRepository::find_by_id_tx(&tx, &event.task_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "Task".to_string(),
                id: event.task_id.clone(),
            }
        })?;

        // 终态任务不再接受事件（重复 work_complete 在此被挡下，
        // 不会二次派生余量任务或二次计数）
        if task.status.is_terminal() {
            return Err(RepositoryError::InvalidStateTransition {
                from: task.status.to_string(),
                to: event.event_type.to_string(),
            });
        }

        let log = WorkLog::new(
            task.id.clone(),
            worker_id.to_string(),
            task.machine_id.clone(),
            event.event_type,
        )
        .with_pause_reason(event.pause_reason)
        .with_quantity_completed(event.quantity_completed)
        .with_notes(event.notes);

        // 先算后写
        let plan = plan_transition(&task, event.event_type, event.quantity_completed);

        WorkLogRepository::insert_tx(&tx, &log)?;
        Self::apply_plan(&tx, &task, worker_id, &plan)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::debug!(
            task_id = %task.id,
            new_task_status = ?plan.task,
            "工作日志事件已级联应用"
        );

        Ok(log)
    }

    /// 在事务内应用转换计划
    ///
    /// 写入顺序: 任务 → 余量任务 → 工单 → 机台。
    /// 工单完成判定发生在余量任务插入之后，
    /// 因此产生余量的完成事件不会在同一事件内完成工单
    fn apply_plan(
        tx: &Connection,
        task: &Task,
        worker_id: &str,
        plan: &TransitionPlan,
    ) -> RepositoryResult<()> {
        // 1. 任务
        match plan.task {
            TaskChange::Status(next) => {
                TaskRepository::force_status_tx(tx, &task.id, next)?;
            }
            TaskChange::Complete { quantity } => {
                let applied = TaskRepository::complete_tx(tx, &task.id, quantity)?;
                if !applied {
                    return Err(RepositoryError::InvalidStateTransition {
                        from: task.status.to_string(),
                        to: TaskStatus::Completed.to_string(),
                    });
                }
            }
        }

        // 2. 余量任务（部分完成）
        if let Some(remaining) = plan.remainder_quantity {
            let remainder = task.spawn_remainder(remaining);
            TaskRepository::insert_tx(tx, &remainder)?;
            tracing::info!(
                work_order_id = %task.work_order_id,
                source_task_id = %task.id,
                remainder_task_id = %remainder.id,
                remaining,
                "部分完成，已派生余量任务"
            );
        }

        // 3. 工单
        match plan.work_order {
            WorkOrderChange::Unchanged => {}
            WorkOrderChange::InProgress => {
                WorkOrderRepository::set_status_tx(
                    tx,
                    &task.work_order_id,
                    WorkOrderStatus::InProgress,
                )?;
            }
            WorkOrderChange::CompleteIfAllTasksDone => {
                let siblings = TaskRepository::find_by_work_order_tx(tx, &task.work_order_id)?;
                let all_completed = siblings
                    .iter()
                    .all(|t| t.status == TaskStatus::Completed);
                if all_completed {
                    WorkOrderRepository::set_status_tx(
                        tx,
                        &task.work_order_id,
                        WorkOrderStatus::Completed,
                    )?;
                }
            }
        }

        // 4. 机台
        match plan.machine {
            MachineChange::Running => {
                MachineRepository::set_status_tx(tx, &task.machine_id, MachineStatus::Running)?;
            }
            MachineChange::RunningWithBinding => {
                MachineRepository::bind_tx(
                    tx,
                    &task.machine_id,
                    &task.id,
                    worker_id,
                    &task.work_order_id,
                )?;
            }
            MachineChange::Pause => {
                MachineRepository::set_status_tx(tx, &task.machine_id, MachineStatus::Pause)?;
            }
            MachineChange::IdleCleared => {
                MachineRepository::clear_binding_tx(tx, &task.machine_id)?;
            }
        }

        Ok(())
    }

    // ==========================================
    // 任务分派 / 撤回（同样涉及工单/机台级联）
    // ==========================================

    /// 分派任务: 插入任务并将工单置为 assigned（同一事务）
    #[instrument(skip(self, task), fields(task_id = %task.id, work_order_id = %task.work_order_id))]
    pub fn assign_task(&self, task: &Task) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        TaskRepository::insert_tx(&tx, task)?;
        WorkOrderRepository::set_status_tx(&tx, &task.work_order_id, WorkOrderStatus::Assigned)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 撤回任务: 删除任务并将其机台复位为空闲（清空全部绑定，同一事务）
    ///
    /// # 返回
    /// - Ok(Task): 被撤回任务的快照
    /// - Err(NotFound): 任务不存在
    #[instrument(skip(self))]
    pub fn retract_task(&self, task_id: &str) -> RepositoryResult<Task> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let task = TaskRepository::find_by_id_tx(&tx, task_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "Task".to_string(),
                id: task_id.to_string(),
            }
        })?;

        TaskRepository::delete_tx(&tx, task_id)?;
        MachineRepository::clear_binding_tx(&tx, &task.machine_id)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(task)
    }
}

// ==========================================
// 单元测试（纯函数部分）
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task(assigned: i64) -> Task {
        Task::new(
            "WO001".to_string(),
            "M001".to_string(),
            "SUPERVISOR001".to_string(),
            assigned,
        )
    }

    #[test]
    fn test_prep_start_binds_machine() {
        let task = sample_task(100);
        let plan = plan_transition(&task, WorkLogEventType::PrepStart, None);
        assert_eq!(plan.task, TaskChange::Status(TaskStatus::Preparation));
        assert_eq!(plan.work_order, WorkOrderChange::Unchanged);
        assert_eq!(plan.machine, MachineChange::RunningWithBinding);
        assert!(plan.remainder_quantity.is_none());
    }

    #[test]
    fn test_prep_end_and_work_start_mark_order_in_progress() {
        let task = sample_task(100);
        for event in [WorkLogEventType::PrepEnd, WorkLogEventType::WorkStart] {
            let plan = plan_transition(&task, event, None);
            assert_eq!(plan.task, TaskChange::Status(TaskStatus::InProgress));
            assert_eq!(plan.work_order, WorkOrderChange::InProgress);
            assert_eq!(plan.machine, MachineChange::Running);
        }
    }

    #[test]
    fn test_pause_and_resume() {
        let task = sample_task(100);
        let plan = plan_transition(&task, WorkLogEventType::WorkPause, None);
        assert_eq!(plan.task, TaskChange::Status(TaskStatus::Paused));
        assert_eq!(plan.machine, MachineChange::Pause);
        assert_eq!(plan.work_order, WorkOrderChange::Unchanged);

        let plan = plan_transition(&task, WorkLogEventType::WorkResume, None);
        assert_eq!(plan.task, TaskChange::Status(TaskStatus::InProgress));
        assert_eq!(plan.machine, MachineChange::Running);
        assert_eq!(plan.work_order, WorkOrderChange::Unchanged);
    }

    #[test]
    fn test_partial_complete_spawns_remainder() {
        let task = sample_task(100);
        let plan = plan_transition(&task, WorkLogEventType::WorkComplete, Some(60));
        assert_eq!(plan.task, TaskChange::Complete { quantity: 60 });
        assert_eq!(plan.remainder_quantity, Some(40));
        assert_eq!(plan.work_order, WorkOrderChange::CompleteIfAllTasksDone);
        assert_eq!(plan.machine, MachineChange::IdleCleared);
    }

    #[test]
    fn test_full_complete_spawns_nothing() {
        let task = sample_task(100);
        let plan = plan_transition(&task, WorkLogEventType::WorkComplete, Some(100));
        assert_eq!(plan.remainder_quantity, None);

        // 超量完成同样不派生
        let plan = plan_transition(&task, WorkLogEventType::WorkComplete, Some(120));
        assert_eq!(plan.remainder_quantity, None);
    }

    #[test]
    fn test_complete_without_quantity_defaults_to_zero() {
        let task = sample_task(100);
        let plan = plan_transition(&task, WorkLogEventType::WorkComplete, None);
        assert_eq!(plan.task, TaskChange::Complete { quantity: 0 });
        // 数量缺省为 0，全部数量成为余量
        assert_eq!(plan.remainder_quantity, Some(100));
    }
}
