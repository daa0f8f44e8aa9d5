// ==========================================
// 车间生产执行跟踪系统 - 会话仓储
// ==========================================
// 职责: 管理 sessions 表 (不透明 Bearer 令牌)
// 说明: 令牌由 AuthApi 签发，带过期时间；过期令牌在解析时惰性清理
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 会话实体
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,              // 令牌 (UUID)
    pub user_id: String,            // 用户ID
    pub created_at: DateTime<Utc>,  // 签发时间
    pub expires_at: DateTime<Utc>,  // 过期时间
}

pub struct SessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SessionRepository {
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
            CREATE TABLE IF NOT EXISTS sessions (
              token TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              created_at TEXT NOT NULL,
              expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
            "#,
        )?;
        Ok(())
    }

    /// 插入会话
    pub fn insert(&self, session: &Session) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.token,
                session.user_id,
                session.created_at,
                session.expires_at,
            ],
        )?;
        Ok(())
    }

    /// 按令牌查询会话
    pub fn find_by_token(&self, token: &str) -> RepositoryResult<Option<Session>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
        )?;
        match stmt.query_row(params![token], Self::map_row) {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除单个会话（过期清理）
    pub fn delete(&self, token: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(rows > 0)
    }

    /// 删除截至时刻已过期的全部会话
    ///
    /// # 返回
    /// - Ok(rows): 被清理的会话数
    pub fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?;
        Ok(rows)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<Session> {
        Ok(Session {
            token: row.get(0)?,
            user_id: row.get(1)?,
            created_at: row.get(2)?,
            expires_at: row.get(3)?,
        })
    }
}
