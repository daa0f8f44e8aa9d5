// ==========================================
// 车间生产执行跟踪系统 - 工单仓储
// ==========================================
// 职责: 管理 work_orders 表
// 说明: status 列只由状态引擎通过 *_tx 变体写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::WorkOrderStatus;
use crate::domain::work_order::WorkOrder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{column_parse_error, ENTITY_PAGE_LIMIT};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
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
            CREATE TABLE IF NOT EXISTS work_orders (
              id TEXT PRIMARY KEY,
              order_no TEXT NOT NULL,
              part_name TEXT NOT NULL,
              quantity INTEGER NOT NULL,
              description TEXT,
              status TEXT NOT NULL DEFAULT 'pending',
              created_at TEXT NOT NULL,
              created_by TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_work_orders_status ON work_orders(status);
            CREATE INDEX IF NOT EXISTS idx_work_orders_order_no ON work_orders(order_no);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入工单
    pub fn insert(&self, order: &WorkOrder) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO work_orders (
                id, order_no, part_name, quantity, description, status, created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                order.id,
                order.order_no,
                order.part_name,
                order.quantity,
                order.description,
                order.status.as_str(),
                order.created_at,
                order.created_by,
            ],
        )?;
        Ok(order.id.clone())
    }

    /// 删除工单
    pub fn delete(&self, order_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM work_orders WHERE id = ?1", params![order_id])?;
        Ok(rows > 0)
    }

    // ==========================================
    // 事务内写入（状态引擎专用）
    // ==========================================

    /// 事务内: 更新工单状态
    pub fn set_status_tx(
        conn: &Connection,
        order_id: &str,
        status: WorkOrderStatus,
    ) -> RepositoryResult<()> {
        conn.execute(
            "UPDATE work_orders SET status = ?2 WHERE id = ?1",
            params![order_id, status.as_str()],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询工单
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, order_id)
    }

    /// 事务内: 按ID查询工单
    pub fn find_by_id_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_no, part_name, quantity, description, status, created_at, created_by
            FROM work_orders
            WHERE id = ?1
            "#,
        )?;
        match stmt.query_row(params![order_id], Self::map_row) {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部工单
    pub fn list(&self) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_no, part_name, quantity, description, status, created_at, created_by
            FROM work_orders
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )?;
        let orders = stmt
            .query_map(params![ENTITY_PAGE_LIMIT], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> SqliteResult<WorkOrder> {
        let status_str: String = row.get(5)?;
        let status = WorkOrderStatus::parse(&status_str)
            .ok_or_else(|| column_parse_error(5, &status_str, "工单状态"))?;
        let created_at: DateTime<Utc> = row.get(6)?;
        Ok(WorkOrder {
            id: row.get(0)?,
            order_no: row.get(1)?,
            part_name: row.get(2)?,
            quantity: row.get(3)?,
            description: row.get(4)?,
            status,
            created_at,
            created_by: row.get(7)?,
        })
    }
}
