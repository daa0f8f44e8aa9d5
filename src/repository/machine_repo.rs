// ==========================================
// 车间生产执行跟踪系统 - 机台仓储
// ==========================================
// 职责: 管理 machines 表
// 说明: 绑定指针 (当前任务/操作工/工单) 由状态引擎通过 *_tx 变体
//       在同一事务内维护，保证全有或全无
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::machine::Machine;
use crate::domain::types::MachineStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{column_parse_error, ENTITY_PAGE_LIMIT};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct MachineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineRepository {
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
            CREATE TABLE IF NOT EXISTS machines (
              id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              code TEXT NOT NULL UNIQUE,
              status TEXT NOT NULL DEFAULT 'idle',
              current_work_order_id TEXT,
              current_worker_id TEXT,
              current_task_id TEXT,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_machines_status ON machines(status);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入机台
    pub fn insert(&self, machine: &Machine) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO machines (
                id, name, code, status,
                current_work_order_id, current_worker_id, current_task_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                machine.id,
                machine.name,
                machine.code,
                machine.status.as_str(),
                machine.current_work_order_id,
                machine.current_worker_id,
                machine.current_task_id,
                machine.created_at,
            ],
        )?;
        Ok(machine.id.clone())
    }

    /// 字段级更新（名称/代码，None 表示不更新）
    ///
    /// 状态与绑定不走此方法：它们只能由状态引擎写入
    pub fn update_fields(
        &self,
        machine_id: &str,
        name: Option<&str>,
        code: Option<&str>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE machines SET
                name = COALESCE(?2, name),
                code = COALESCE(?3, code)
            WHERE id = ?1
            "#,
            params![machine_id, name, code],
        )?;
        Ok(rows > 0)
    }

    /// 删除机台（无级联要求）
    pub fn delete(&self, machine_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM machines WHERE id = ?1", params![machine_id])?;
        Ok(rows > 0)
    }

    // ==========================================
    // 事务内写入（状态引擎专用）
    // ==========================================

    /// 事务内: 仅更新机台状态（不触碰绑定）
    pub fn set_status_tx(
        conn: &Connection,
        machine_id: &str,
        status: MachineStatus,
    ) -> RepositoryResult<()> {
        conn.execute(
            "UPDATE machines SET status = ?2 WHERE id = ?1",
            params![machine_id, status.as_str()],
        )?;
        Ok(())
    }

    /// 事务内: 置为运行中并同时写入三个绑定指针
    pub fn bind_tx(
        conn: &Connection,
        machine_id: &str,
        task_id: &str,
        worker_id: &str,
        work_order_id: &str,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            UPDATE machines SET
                status = 'running',
                current_task_id = ?2,
                current_worker_id = ?3,
                current_work_order_id = ?4
            WHERE id = ?1
            "#,
            params![machine_id, task_id, worker_id, work_order_id],
        )?;
        Ok(())
    }

    /// 事务内: 置为空闲并同时清空三个绑定指针
    pub fn clear_binding_tx(conn: &Connection, machine_id: &str) -> RepositoryResult<()> {
        conn.execute(
            r#"
            UPDATE machines SET
                status = 'idle',
                current_task_id = NULL,
                current_worker_id = NULL,
                current_work_order_id = NULL
            WHERE id = ?1
            "#,
            params![machine_id],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询机台
    pub fn find_by_id(&self, machine_id: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, machine_id)
    }

    /// 事务内: 按ID查询机台
    pub fn find_by_id_tx(conn: &Connection, machine_id: &str) -> RepositoryResult<Option<Machine>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, code, status,
                   current_work_order_id, current_worker_id, current_task_id, created_at
            FROM machines
            WHERE id = ?1
            "#,
        )?;
        match stmt.query_row(params![machine_id], Self::map_row) {
            Ok(machine) => Ok(Some(machine)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按机台代码查询
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, code, status,
                   current_work_order_id, current_worker_id, current_task_id, created_at
            FROM machines
            WHERE code = ?1
            "#,
        )?;
        match stmt.query_row(params![code], Self::map_row) {
            Ok(machine) => Ok(Some(machine)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部机台
    pub fn list(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, code, status,
                   current_work_order_id, current_worker_id, current_task_id, created_at
            FROM machines
            ORDER BY code ASC
            LIMIT ?1
            "#,
        )?;
        let machines = stmt
            .query_map(params![ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(machines)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<Machine> {
        let status_str: String = row.get(3)?;
        let status = MachineStatus::parse(&status_str)
            .ok_or_else(|| column_parse_error(3, &status_str, "机台状态"))?;
        let created_at: DateTime<Utc> = row.get(7)?;
        Ok(Machine {
            id: row.get(0)?,
            name: row.get(1)?,
            code: row.get(2)?,
            status,
            current_work_order_id: row.get(4)?,
            current_worker_id: row.get(5)?,
            current_task_id: row.get(6)?,
            created_at,
        })
    }
}
