// ==========================================
// 车间生产执行跟踪系统 - 用户仓储
// ==========================================
// 职责: 管理 users 表
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::UserRole;
use crate::domain::user::User;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{column_parse_error, ENTITY_PAGE_LIMIT};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
              id TEXT PRIMARY KEY,
              username TEXT NOT NULL UNIQUE,
              password_hash TEXT NOT NULL,
              full_name TEXT NOT NULL,
              role TEXT NOT NULL,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入用户
    pub fn insert(&self, user: &User) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO users (id, username, password_hash, full_name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user.id,
                user.username,
                user.password_hash,
                user.full_name,
                user.role.as_str(),
                user.created_at,
            ],
        )?;
        Ok(user.id.clone())
    }

    /// 字段级更新（None 表示不更新该字段）
    ///
    /// # 返回
    /// - Ok(true): 记录存在且已更新
    /// - Ok(false): 记录不存在
    pub fn update_fields(
        &self,
        user_id: &str,
        full_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE users SET
                full_name = COALESCE(?2, full_name),
                password_hash = COALESCE(?3, password_hash)
            WHERE id = ?1
            "#,
            params![user_id, full_name, password_hash],
        )?;
        Ok(rows > 0)
    }

    /// 删除用户（硬删除）
    pub fn delete(&self, user_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        Ok(rows > 0)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询用户
    pub fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, full_name, role, created_at FROM users WHERE id = ?1",
        )?;
        match stmt.query_row(params![user_id], Self::map_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按登录名查询用户
    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, full_name, role, created_at FROM users WHERE username = ?1",
        )?;
        match stmt.query_row(params![username], Self::map_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部用户
    pub fn list(&self) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, username, password_hash, full_name, role, created_at
            FROM users
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )?;
        let users = stmt
            .query_map(params![ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<User> {
        let role_str: String = row.get(4)?;
        let role = UserRole::parse(&role_str)
            .ok_or_else(|| column_parse_error(4, &role_str, "用户角色"))?;
        let created_at: DateTime<Utc> = row.get(5)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            full_name: row.get(3)?,
            role,
            created_at,
        })
    }
}
