// ==========================================
// 车间生产执行跟踪系统 - 工作日志 API
// ==========================================
// 职责: 接收现场事件并触发状态引擎级联；任务日志查询
// 说明: worker_id 由调用者身份推导，machine_id 由任务推导，
//       客户端不可伪造
// ==========================================

use std::sync::Arc;

use serde::Deserialize;

use crate::api::auth_api::CurrentUser;
use crate::api::error::ApiResult;
use crate::domain::types::{PauseReason, WorkLogEventType};
use crate::domain::work_log::WorkLog;
use crate::engine::{NewWorkLogEvent, StatusEngine};
use crate::repository::WorkLogRepository;

// ==========================================
// 请求结构
// ==========================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkLogRequest {
    pub task_id: String,
    pub event_type: WorkLogEventType,
    pub pause_reason: Option<PauseReason>,
    pub quantity_completed: Option<i64>,
    pub notes: Option<String>,
}

// ==========================================
// WorkLogApi - 工作日志 API
// ==========================================
pub struct WorkLogApi {
    status_engine: Arc<StatusEngine>,
    work_log_repo: Arc<WorkLogRepository>,
}

impl WorkLogApi {
    /// 创建新的工作日志 API 实例
    pub fn new(status_engine: Arc<StatusEngine>, work_log_repo: Arc<WorkLogRepository>) -> Self {
        Self {
            status_engine,
            work_log_repo,
        }
    }

    /// 提交工作日志事件（任意已认证角色）
    ///
    /// 执行完整的状态引擎级联（任务/工单/机台）并返回持久化的日志
    pub fn create(
        &self,
        current: &CurrentUser,
        request: CreateWorkLogRequest,
    ) -> ApiResult<WorkLog> {
        let event = NewWorkLogEvent {
            task_id: request.task_id,
            event_type: request.event_type,
            pause_reason: request.pause_reason,
            quantity_completed: request.quantity_completed,
            notes: request.notes,
        };
        let log = self.status_engine.apply_work_log_event(&current.id, event)?;
        Ok(log)
    }

    /// 查询任务的全部日志（按时间升序）
    pub fn list_task_logs(&self, _current: &CurrentUser, task_id: &str) -> ApiResult<Vec<WorkLog>> {
        Ok(self.work_log_repo.find_by_task(task_id)?)
    }
}
