// ==========================================
// 车间生产执行跟踪系统 - 用户管理 API
// ==========================================
// 职责: 用户 CRUD（仅管理员）
// 红线: 密码摘要永不出现在响应中
// ==========================================

use std::sync::Arc;

use serde::Deserialize;

use crate::api::auth_api::{hash_password, CurrentUser};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::UserRole;
use crate::domain::user::{PublicUser, User};
use crate::i18n::t;
use crate::repository::UserRepository;

// ==========================================
// 请求结构
// ==========================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub password: Option<String>,
}

// ==========================================
// UserApi - 用户管理 API
// ==========================================
pub struct UserApi {
    user_repo: Arc<UserRepository>,
}

impl UserApi {
    /// 创建新的用户管理 API 实例
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 查询全部用户（仅管理员）
    pub fn list(&self, current: &CurrentUser) -> ApiResult<Vec<PublicUser>> {
        current.require_admin()?;
        let users = self.user_repo.list()?;
        Ok(users.iter().map(User::to_public).collect())
    }

    /// 创建用户（仅管理员）
    ///
    /// # 返回
    /// - Err(Conflict): 用户名已存在
    pub fn create(&self, current: &CurrentUser, request: CreateUserRequest) -> ApiResult<PublicUser> {
        current.require_admin()?;

        if request.username.trim().is_empty() {
            return Err(ApiError::InvalidInput("用户名不能为空".to_string()));
        }
        if request.password.is_empty() {
            return Err(ApiError::InvalidInput("密码不能为空".to_string()));
        }

        if self.user_repo.find_by_username(&request.username)?.is_some() {
            return Err(ApiError::Conflict(format!(
                "用户名已存在: {}",
                request.username
            )));
        }

        let user = User::new(
            request.username,
            hash_password(&request.password),
            request.full_name,
            request.role,
        );
        self.user_repo.insert(&user)?;

        tracing::info!(user_id = %user.id, role = %user.role, "用户已创建");
        Ok(user.to_public())
    }

    /// 更新用户（仅管理员；姓名/密码字段级更新）
    ///
    /// # 返回
    /// - Err(InvalidInput): 没有任何待更新字段
    /// - Err(NotFound): 用户不存在
    pub fn update(
        &self,
        current: &CurrentUser,
        user_id: &str,
        request: UpdateUserRequest,
    ) -> ApiResult<PublicUser> {
        current.require_admin()?;

        if request.full_name.is_none() && request.password.is_none() {
            return Err(ApiError::InvalidInput("没有待更新的数据".to_string()));
        }

        let password_hash = request.password.as_deref().map(hash_password);
        let updated = self.user_repo.update_fields(
            user_id,
            request.full_name.as_deref(),
            password_hash.as_deref(),
        )?;
        if !updated {
            return Err(ApiError::NotFound(format!("用户不存在: {}", user_id)));
        }

        let user = self
            .user_repo
            .find_by_id(user_id)?
            .ok_or_else(|| ApiError::NotFound(format!("用户不存在: {}", user_id)))?;
        Ok(user.to_public())
    }

    /// 删除用户（仅管理员，硬删除）
    pub fn delete(&self, current: &CurrentUser, user_id: &str) -> ApiResult<String> {
        current.require_admin()?;

        if !self.user_repo.delete(user_id)? {
            return Err(ApiError::NotFound(format!("用户不存在: {}", user_id)));
        }

        tracing::info!(user_id, "用户已删除");
        Ok(t("user.deleted"))
    }
}
