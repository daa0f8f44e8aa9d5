// ==========================================
// 车间生产执行跟踪系统 - 机台管理 API
// ==========================================
// 职责: 机台 CRUD（写操作仅管理员）
// 说明: 机台状态与绑定指针不在此处修改——它们只属于状态引擎
// ==========================================

use std::sync::Arc;

use serde::Deserialize;

use crate::api::auth_api::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::machine::Machine;
use crate::i18n::t;
use crate::repository::MachineRepository;

// ==========================================
// 请求结构
// ==========================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMachineRequest {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMachineRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

// ==========================================
// MachineApi - 机台管理 API
// ==========================================
pub struct MachineApi {
    machine_repo: Arc<MachineRepository>,
}

impl MachineApi {
    /// 创建新的机台管理 API 实例
    pub fn new(machine_repo: Arc<MachineRepository>) -> Self {
        Self { machine_repo }
    }

    /// 查询全部机台（任意角色）
    pub fn list(&self, _current: &CurrentUser) -> ApiResult<Vec<Machine>> {
        Ok(self.machine_repo.list()?)
    }

    /// 创建机台（仅管理员）
    ///
    /// # 返回
    /// - Err(Conflict): 机台代码已存在
    pub fn create(
        &self,
        current: &CurrentUser,
        request: CreateMachineRequest,
    ) -> ApiResult<Machine> {
        current.require_admin()?;

        if request.code.trim().is_empty() {
            return Err(ApiError::InvalidInput("机台代码不能为空".to_string()));
        }

        if self.machine_repo.find_by_code(&request.code)?.is_some() {
            return Err(ApiError::Conflict(format!(
                "机台代码已存在: {}",
                request.code
            )));
        }

        let machine = Machine::new(request.name, request.code);
        self.machine_repo.insert(&machine)?;

        tracing::info!(machine_id = %machine.id, code = %machine.code, "机台已创建");
        Ok(machine)
    }

    /// 更新机台（仅管理员；名称/代码字段级更新）
    pub fn update(
        &self,
        current: &CurrentUser,
        machine_id: &str,
        request: UpdateMachineRequest,
    ) -> ApiResult<Machine> {
        current.require_admin()?;

        if request.name.is_none() && request.code.is_none() {
            return Err(ApiError::InvalidInput("没有待更新的数据".to_string()));
        }

        let updated = self.machine_repo.update_fields(
            machine_id,
            request.name.as_deref(),
            request.code.as_deref(),
        )?;
        if !updated {
            return Err(ApiError::NotFound(format!("机台不存在: {}", machine_id)));
        }

        let machine = self
            .machine_repo
            .find_by_id(machine_id)?
            .ok_or_else(|| ApiError::NotFound(format!("机台不存在: {}", machine_id)))?;
        Ok(machine)
    }

    /// 删除机台（仅管理员，无级联）
    pub fn delete(&self, current: &CurrentUser, machine_id: &str) -> ApiResult<String> {
        current.require_admin()?;

        if !self.machine_repo.delete(machine_id)? {
            return Err(ApiError::NotFound(format!("机台不存在: {}", machine_id)));
        }

        tracing::info!(machine_id, "机台已删除");
        Ok(t("machine.deleted"))
    }
}
