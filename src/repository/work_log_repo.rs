// ==========================================
// 车间生产执行跟踪系统 - 工作日志仓储
// ==========================================
// 职责: 管理 work_logs 表
// 红线: 追加式，不提供 UPDATE / DELETE
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::{PauseReason, WorkLogEventType};
use crate::domain::work_log::WorkLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{column_parse_error, LOG_PAGE_LIMIT};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, task_id, worker_id, machine_id, event_type,
           timestamp, pause_reason, quantity_completed, notes
    FROM work_logs
"#;

pub struct WorkLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkLogRepository {
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
            CREATE TABLE IF NOT EXISTS work_logs (
              id TEXT PRIMARY KEY,
              task_id TEXT NOT NULL,
              worker_id TEXT NOT NULL,
              machine_id TEXT NOT NULL,
              event_type TEXT NOT NULL,
              timestamp TEXT NOT NULL,
              pause_reason TEXT,
              quantity_completed INTEGER,
              notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_work_logs_task ON work_logs(task_id);
            CREATE INDEX IF NOT EXISTS idx_work_logs_worker ON work_logs(worker_id);
            CREATE INDEX IF NOT EXISTS idx_work_logs_timestamp ON work_logs(timestamp);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作（仅插入）
    // ==========================================

    /// 插入工作日志
    pub fn insert(&self, log: &WorkLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, log)
    }

    /// 事务内: 插入工作日志
    pub fn insert_tx(conn: &Connection, log: &WorkLog) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO work_logs (
                id, task_id, worker_id, machine_id, event_type,
                timestamp, pause_reason, quantity_completed, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                log.id,
                log.task_id,
                log.worker_id,
                log.machine_id,
                log.event_type.as_str(),
                log.timestamp,
                log.pause_reason.map(|r| r.as_str()),
                log.quantity_completed,
                log.notes,
            ],
        )?;
        Ok(log.id.clone())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询任务的全部日志（按时间升序，时间重建的输入顺序）
    pub fn find_by_task(&self, task_id: &str) -> RepositoryResult<Vec<WorkLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE task_id = ?1 ORDER BY timestamp ASC LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![task_id, LOG_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询时间窗口内的日志（左闭右开: start <= timestamp < end，日报窗口）
    pub fn find_in_window_exclusive(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<WorkLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp ASC LIMIT ?3",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![start, end, LOG_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询时间窗口内的日志（双闭: start <= timestamp <= end，周报/区间窗口）
    pub fn find_in_window_inclusive(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<WorkLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE timestamp >= ?1 AND timestamp <= ?2 ORDER BY timestamp ASC LIMIT ?3",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![start, end, LOG_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询操作工在时间窗口内的日志（双闭区间，绩效报表用）
    pub fn find_by_worker_in_window(
        &self,
        worker_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<WorkLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE worker_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            ORDER BY timestamp ASC
            LIMIT ?4
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![worker_id, start, end, LOG_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<WorkLog> {
        let event_str: String = row.get(4)?;
        let event_type = WorkLogEventType::parse(&event_str)
            .ok_or_else(|| column_parse_error(4, &event_str, "事件类型"))?;
        let timestamp: DateTime<Utc> = row.get(5)?;
        let pause_reason: Option<String> = row.get(6)?;
        let pause_reason = match pause_reason {
            Some(s) => Some(
                PauseReason::parse(&s).ok_or_else(|| column_parse_error(6, &s, "暂停原因"))?,
            ),
            None => None,
        };
        Ok(WorkLog {
            id: row.get(0)?,
            task_id: row.get(1)?,
            worker_id: row.get(2)?,
            machine_id: row.get(3)?,
            event_type,
            timestamp,
            pause_reason,
            quantity_completed: row.get(7)?,
            notes: row.get(8)?,
        })
    }
}
