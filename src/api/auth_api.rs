// ==========================================
// 车间生产执行跟踪系统 - 认证 API
// ==========================================
// 职责: 登录校验、会话令牌签发与解析
// 红线: 登录失败只返回一条统一消息，不泄露用户名/密码哪项有误
// 说明: 密码摘要格式 "salt$hex(sha256(salt + password))"，
//       令牌为不透明 UUID，持久化于 sessions 表并带过期时间
// ==========================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::types::UserRole;
use crate::domain::user::{PublicUser, User};
use crate::i18n::t;
use crate::repository::{Session, SessionRepository, UserRepository};

// ==========================================
// CurrentUser - 已认证调用者
// ==========================================

/// 已认证调用者（由令牌解析得到，传入所有业务 API）
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// 要求管理员角色
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("该操作需要管理员权限".to_string()))
        }
    }

    /// 要求管理员或班组长角色
    pub fn require_supervisor(&self) -> ApiResult<()> {
        if matches!(self.role, UserRole::Admin | UserRole::Supervisor) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "该操作需要管理员或班组长权限".to_string(),
            ))
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

// ==========================================
// 请求/响应结构
// ==========================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

// ==========================================
// 密码摘要
// ==========================================

/// 生成密码摘要: "salt$hex(sha256(salt + password))"
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest_hex(&salt, password))
}

/// 校验密码与存储摘要是否匹配
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest_hex(salt, password) == expected,
        None => false,
    }
}

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

// ==========================================
// AuthApi - 认证 API
// ==========================================
pub struct AuthApi {
    user_repo: Arc<UserRepository>,
    session_repo: Arc<SessionRepository>,
    config: Arc<ConfigManager>,
}

impl AuthApi {
    /// 创建新的认证 API 实例
    pub fn new(
        user_repo: Arc<UserRepository>,
        session_repo: Arc<SessionRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    // ==========================================
    // 登录
    // ==========================================

    /// 登录并签发令牌
    ///
    /// # 返回
    /// - Ok(LoginResponse): 令牌 + 用户对外视图
    /// - Err(Unauthorized): 用户名或密码不匹配（统一消息）
    pub fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let user = self.user_repo.find_by_username(&request.username)?;

        // 用户不存在与密码错误走同一失败路径
        let user = match user {
            Some(u) if verify_password(&request.password, &u.password_hash) => u,
            _ => {
                tracing::info!(username = %request.username, "登录失败");
                return Err(ApiError::Unauthorized(t("auth.invalid_credentials")));
            }
        };

        let ttl_days = self
            .config
            .get_session_ttl_days()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
        };
        self.session_repo.insert(&session)?;

        tracing::info!(user_id = %user.id, role = %user.role, "登录成功");

        Ok(LoginResponse {
            token: session.token,
            user: user.to_public(),
        })
    }

    // ==========================================
    // 令牌解析
    // ==========================================

    /// 解析 Bearer 令牌为已认证调用者
    ///
    /// # 返回
    /// - Ok(CurrentUser): 令牌有效
    /// - Err(Unauthorized): 令牌未知 / 已过期 / 对应用户已被删除
    pub fn resolve_token(&self, token: &str) -> ApiResult<CurrentUser> {
        let session = self
            .session_repo
            .find_by_token(token)?
            .ok_or_else(|| ApiError::Unauthorized(t("auth.invalid_token")))?;

        if session.expires_at < Utc::now() {
            // 惰性清理过期会话
            let _ = self.session_repo.delete(&session.token);
            return Err(ApiError::Unauthorized(t("auth.token_expired")));
        }

        let user = self
            .user_repo
            .find_by_id(&session.user_id)?
            .ok_or_else(|| ApiError::Unauthorized(t("auth.invalid_token")))?;

        Ok(CurrentUser::from(&user))
    }
}
