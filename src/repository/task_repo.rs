// ==========================================
// 车间生产执行跟踪系统 - 任务仓储
// ==========================================
// 职责: 管理 tasks 表
// 说明: status / quantity_completed 列只由状态引擎通过 *_tx 变体写入;
//       完成写入以"期望前置状态"为条件，保证重复事件不二次生效
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::task::Task;
use crate::domain::types::TaskStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{column_parse_error, ENTITY_PAGE_LIMIT};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, work_order_id, machine_id, assigned_worker_id, assigned_by,
           status, quantity_assigned, quantity_completed, assigned_at
    FROM tasks
"#;

pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
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
            CREATE TABLE IF NOT EXISTS tasks (
              id TEXT PRIMARY KEY,
              work_order_id TEXT NOT NULL,
              machine_id TEXT NOT NULL,
              assigned_worker_id TEXT,
              assigned_by TEXT NOT NULL,
              status TEXT NOT NULL DEFAULT 'assigned',
              quantity_assigned INTEGER NOT NULL,
              quantity_completed INTEGER NOT NULL DEFAULT 0,
              assigned_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_work_order ON tasks(work_order_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_machine ON tasks(machine_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_worker ON tasks(assigned_worker_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 绑定操作工到任务（任务领取）
    ///
    /// # 返回
    /// - Ok(true): 任务存在且已绑定
    /// - Ok(false): 任务不存在
    pub fn set_assigned_worker(&self, task_id: &str, worker_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE tasks SET assigned_worker_id = ?2 WHERE id = ?1",
            params![task_id, worker_id],
        )?;
        Ok(rows > 0)
    }

    // ==========================================
    // 事务内写入（状态引擎专用）
    // ==========================================

    /// 事务内: 插入任务
    pub fn insert_tx(conn: &Connection, task: &Task) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO tasks (
                id, work_order_id, machine_id, assigned_worker_id, assigned_by,
                status, quantity_assigned, quantity_completed, assigned_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                task.id,
                task.work_order_id,
                task.machine_id,
                task.assigned_worker_id,
                task.assigned_by,
                task.status.as_str(),
                task.quantity_assigned,
                task.quantity_completed,
                task.assigned_at,
            ],
        )?;
        Ok(task.id.clone())
    }

    /// 事务内: 更新任务状态（条件于期望前置状态）
    ///
    /// # 返回
    /// - Ok(true): 前置状态匹配且已更新
    /// - Ok(false): 前置状态不匹配（记录未更新）
    pub fn set_status_tx(
        conn: &Connection,
        task_id: &str,
        expected: TaskStatus,
        next: TaskStatus,
    ) -> RepositoryResult<bool> {
        let rows = conn.execute(
            "UPDATE tasks SET status = ?3 WHERE id = ?1 AND status = ?2",
            params![task_id, expected.as_str(), next.as_str()],
        )?;
        Ok(rows > 0)
    }

    /// 事务内: 无条件更新任务状态（前置状态已在引擎内校验）
    pub fn force_status_tx(
        conn: &Connection,
        task_id: &str,
        next: TaskStatus,
    ) -> RepositoryResult<()> {
        conn.execute(
            "UPDATE tasks SET status = ?2 WHERE id = ?1",
            params![task_id, next.as_str()],
        )?;
        Ok(())
    }

    /// 事务内: 完成任务（写入状态 + 完成数量，条件于非终态）
    ///
    /// # 返回
    /// - Ok(true): 任务处于非终态且已完成
    /// - Ok(false): 任务已处于终态（重复完成被拒绝）
    pub fn complete_tx(
        conn: &Connection,
        task_id: &str,
        quantity_completed: i64,
    ) -> RepositoryResult<bool> {
        let rows = conn.execute(
            r#"
            UPDATE tasks SET status = 'completed', quantity_completed = ?2
            WHERE id = ?1 AND status NOT IN ('completed', 'cancelled')
            "#,
            params![task_id, quantity_completed],
        )?;
        Ok(rows > 0)
    }

    /// 事务内: 删除任务（任务撤回）
    pub fn delete_tx(conn: &Connection, task_id: &str) -> RepositoryResult<bool> {
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
        Ok(rows > 0)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询任务
    pub fn find_by_id(&self, task_id: &str) -> RepositoryResult<Option<Task>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, task_id)
    }

    /// 事务内: 按ID查询任务
    pub fn find_by_id_tx(conn: &Connection, task_id: &str) -> RepositoryResult<Option<Task>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        match stmt.query_row(params![task_id], Self::map_row) {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 事务内: 查询工单下的全部任务
    pub fn find_by_work_order_tx(
        conn: &Connection,
        work_order_id: &str,
    ) -> RepositoryResult<Vec<Task>> {
        let sql = format!(
            "{} WHERE work_order_id = ?1 ORDER BY assigned_at ASC LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![work_order_id, ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tasks)
    }

    /// 查询全部任务
    pub fn list(&self) -> RepositoryResult<Vec<Task>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY assigned_at DESC LIMIT ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tasks)
    }

    /// 查询操作工名下未完结的任务
    pub fn find_open_by_worker(&self, worker_id: &str) -> RepositoryResult<Vec<Task>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE assigned_worker_id = ?1
              AND status NOT IN ('completed', 'cancelled')
            ORDER BY assigned_at ASC
            LIMIT ?2
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![worker_id, ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tasks)
    }

    /// 查询处于进行中状态的任务（现场看板用）
    pub fn find_active(&self) -> RepositoryResult<Vec<Task>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE status IN ('preparation', 'in_progress', 'paused')
            ORDER BY assigned_at ASC
            LIMIT ?1
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tasks)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<Task> {
        let status_str: String = row.get(5)?;
        let status = TaskStatus::parse(&status_str)
            .ok_or_else(|| column_parse_error(5, &status_str, "任务状态"))?;
        let assigned_at: DateTime<Utc> = row.get(8)?;
        Ok(Task {
            id: row.get(0)?,
            work_order_id: row.get(1)?,
            machine_id: row.get(2)?,
            assigned_worker_id: row.get(3)?,
            assigned_by: row.get(4)?,
            status,
            quantity_assigned: row.get(6)?,
            quantity_completed: row.get(7)?,
            assigned_at,
        })
    }
}
