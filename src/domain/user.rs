// ==========================================
// 车间生产执行跟踪系统 - 用户领域模型
// ==========================================
// 用途: 身份 + 角色，角色决定授权范围
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::UserRole;

// ==========================================
// User - 用户
// ==========================================
// id 不可变; password_hash 永不出现在对外响应中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,             // 用户ID (UUID)
    pub username: String,       // 登录名 (唯一)
    pub password_hash: String,  // 密码摘要 (salt$hex)
    pub full_name: String,      // 姓名
    pub role: UserRole,         // 角色
    pub created_at: DateTime<Utc>, // 创建时间
}

impl User {
    /// 创建新用户（自动生成 UUID 和时间戳）
    pub fn new(username: String, password_hash: String, full_name: String, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            full_name,
            role,
            created_at: Utc::now(),
        }
    }

    /// 对外视图（剔除密码摘要）
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

// ==========================================
// PublicUser - 用户对外视图
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
