// ==========================================
// 车间生产执行跟踪系统 - 报表 API
// ==========================================
// 职责: 日报 / 区间报 / 操作工绩效（仅管理员）
// 窗口口径:
// - 日报: [当日0点, 次日0点)
// - 区间报/绩效: [起始日0点, 结束日最后一微秒]（双闭）
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::auth_api::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::user::{PublicUser, User};
use crate::domain::work_log::WorkLog;
use crate::engine::{daily_window, range_window, ReportEngine, WorkerPerformanceSummary};
use crate::repository::{UserRepository, WorkLogRepository};

// ==========================================
// 响应结构
// ==========================================

/// 日报
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: String,
    pub total_logs: usize,
    pub total_production: i64,
    pub pause_reasons: HashMap<String, i64>,
    pub logs: Vec<WorkLog>,
}

/// 区间报（周报等）
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    pub start_date: String,
    pub end_date: String,
    pub total_logs: usize,
    pub total_production: i64,
    pub pause_reasons: HashMap<String, i64>,
    pub logs: Vec<WorkLog>,
}

/// 操作工绩效报表
#[derive(Debug, Clone, Serialize)]
pub struct WorkerPerformanceReport {
    pub worker: PublicUser,
    pub start_date: String,
    pub end_date: String,
    pub summary: WorkerPerformanceSummary,
    pub logs: Vec<WorkLog>,
}

// ==========================================
// ReportApi - 报表 API
// ==========================================
pub struct ReportApi {
    work_log_repo: Arc<WorkLogRepository>,
    user_repo: Arc<UserRepository>,
    report_engine: ReportEngine,
}

impl ReportApi {
    /// 创建新的报表 API 实例
    pub fn new(work_log_repo: Arc<WorkLogRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            work_log_repo,
            user_repo,
            report_engine: ReportEngine::new(),
        }
    }

    // ==========================================
    // 日报
    // ==========================================

    /// 日报（仅管理员）
    ///
    /// # 参数
    /// - date: 日期字符串 (YYYY-MM-DD)
    pub fn daily(&self, current: &CurrentUser, date: &str) -> ApiResult<DailyReport> {
        current.require_admin()?;

        let day = parse_date(date)?;
        let (start, end) = daily_window(day);
        let logs = self.work_log_repo.find_in_window_exclusive(start, end)?;
        let summary = self.report_engine.summarize_window(&logs);

        Ok(DailyReport {
            date: date.to_string(),
            total_logs: summary.total_logs,
            total_production: summary.total_production,
            pause_reasons: summary.pause_reasons,
            logs,
        })
    }

    // ==========================================
    // 区间报
    // ==========================================

    /// 区间报（仅管理员；双闭窗口，周报为 7 天区间的特例）
    pub fn range(
        &self,
        current: &CurrentUser,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<RangeReport> {
        current.require_admin()?;

        let (start_day, end_day) = parse_range(start_date, end_date)?;
        let (start, end) = range_window(start_day, end_day);
        let logs = self.work_log_repo.find_in_window_inclusive(start, end)?;
        let summary = self.report_engine.summarize_window(&logs);

        Ok(RangeReport {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            total_logs: summary.total_logs,
            total_production: summary.total_production,
            pause_reasons: summary.pause_reasons,
            logs,
        })
    }

    // ==========================================
    // 操作工绩效
    // ==========================================

    /// 操作工绩效报表（仅管理员）
    ///
    /// 任务集合由操作工日志流推导，工时由时间重建引擎逐任务重建后合并
    pub fn worker_performance(
        &self,
        current: &CurrentUser,
        worker_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<WorkerPerformanceReport> {
        current.require_admin()?;

        let worker = self
            .user_repo
            .find_by_id(worker_id)?
            .as_ref()
            .map(User::to_public)
            .ok_or_else(|| ApiError::NotFound(format!("操作工不存在: {}", worker_id)))?;

        let (start_day, end_day) = parse_range(start_date, end_date)?;
        let (start, end) = range_window(start_day, end_day);
        let logs = self
            .work_log_repo
            .find_by_worker_in_window(worker_id, start, end)?;
        let summary = self.report_engine.summarize_worker(&logs);

        Ok(WorkerPerformanceReport {
            worker,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            summary,
            logs,
        })
    }
}

// ==========================================
// 日期解析
// ==========================================

fn parse_date(date: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidInput(format!("无效的日期格式: {}", date)))
}

fn parse_range(start_date: &str, end_date: &str) -> ApiResult<(NaiveDate, NaiveDate)> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    if start > end {
        return Err(ApiError::InvalidInput(format!(
            "无效的日期区间: {} > {}",
            start_date, end_date
        )));
    }
    Ok((start, end))
}
