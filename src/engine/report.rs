// ==========================================
// 车间生产执行跟踪系统 - 报表聚合引擎
// ==========================================
// 职责: 基于时间窗口过滤后的工作日志构建
//       日报 / 区间报 / 操作工绩效汇总
// 口径:
// - 产量 = quantity_completed 存在且大于 0 的日志之和
// - 暂停计数 = work_pause 事件按原因计数，缺失原因计入 "unknown"
// - 日报窗口 [当日0点, 次日0点)；区间窗口双闭，含结束日最后一微秒
// ==========================================

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{PauseReason, WorkLogEventType};
use crate::domain::work_log::WorkLog;
use crate::engine::time_reconstruction::{TimeReconstructionEngine, WorkerTimeSummary};

// ==========================================
// 时间窗口
// ==========================================

/// 日报窗口: [当日0点, 次日0点)
pub fn daily_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// 区间窗口: [起始日0点, 结束日最后一微秒]（双闭）
pub fn range_window(start_date: NaiveDate, end_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_date.and_time(NaiveTime::MIN).and_utc();
    let end = end_date.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
        - Duration::microseconds(1);
    (start, end)
}

// ==========================================
// 聚合结果
// ==========================================

/// 一个时间窗口内日志的聚合摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogWindowSummary {
    /// 窗口内日志总数
    pub total_logs: usize,
    /// 总产量（quantity_completed 存在且大于 0 的日志之和）
    pub total_production: i64,
    /// 暂停事件按原因计数（缺失原因计入 "unknown"）
    pub pause_reasons: HashMap<String, i64>,
}

/// 暂停时长分桶（分钟，全部原因固定展开）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseBreakdown {
    pub break_minutes: f64,
    pub failure_minutes: f64,
    pub material_shortage_minutes: f64,
    pub toilet_minutes: f64,
    pub prayer_minutes: f64,
    pub meal_minutes: f64,
}

impl PauseBreakdown {
    fn from_summary(summary: &WorkerTimeSummary) -> Self {
        Self {
            break_minutes: round2(summary.pause_minutes(PauseReason::Break)),
            failure_minutes: round2(summary.pause_minutes(PauseReason::Failure)),
            material_shortage_minutes: round2(
                summary.pause_minutes(PauseReason::MaterialShortage),
            ),
            toilet_minutes: round2(summary.pause_minutes(PauseReason::Toilet)),
            prayer_minutes: round2(summary.pause_minutes(PauseReason::Prayer)),
            meal_minutes: round2(summary.pause_minutes(PauseReason::Meal)),
        }
    }
}

/// 操作工绩效汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPerformanceSummary {
    pub total_production: i64,
    pub total_prep_time_minutes: f64,
    pub total_work_time_minutes: f64,
    /// 小时口径包含准备时长（准备 + 生产）
    pub total_work_time_hours: f64,
    pub total_pause_time_minutes: f64,
    pub total_pause_time_hours: f64,
    pub pause_breakdown: PauseBreakdown,
}

// ==========================================
// ReportEngine - 报表聚合引擎
// ==========================================
pub struct ReportEngine {
    time_engine: TimeReconstructionEngine,
}

impl ReportEngine {
    /// 创建新的报表聚合引擎
    pub fn new() -> Self {
        Self {
            time_engine: TimeReconstructionEngine::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 聚合一个时间窗口内的日志（日报/区间报共用）
    pub fn summarize_window(&self, logs: &[WorkLog]) -> LogWindowSummary {
        let total_production = production_total(logs);

        let mut pause_reasons: HashMap<String, i64> = HashMap::new();
        for log in logs {
            if log.event_type == WorkLogEventType::WorkPause {
                let reason = log
                    .pause_reason
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                *pause_reasons.entry(reason).or_insert(0) += 1;
            }
        }

        LogWindowSummary {
            total_logs: logs.len(),
            total_production,
            pause_reasons,
        }
    }

    /// 汇总一名操作工的绩效
    ///
    /// 任务集合由日志流的 task_id 去重得到（日志流是唯一事实来源），
    /// 而非机台/任务上的"当前"绑定指针
    pub fn summarize_worker(&self, logs: &[WorkLog]) -> WorkerPerformanceSummary {
        let mut task_ids: Vec<String> = Vec::new();
        for log in logs {
            if !task_ids.contains(&log.task_id) {
                task_ids.push(log.task_id.clone());
            }
        }

        let times = self.time_engine.reconstruct_worker(&task_ids, logs);
        let total_work = times.total_work_minutes();
        let total_pause = times.total_pause_minutes();

        WorkerPerformanceSummary {
            total_production: production_total(logs),
            total_prep_time_minutes: round2(times.prep_minutes),
            total_work_time_minutes: round2(times.work_minutes),
            total_work_time_hours: round2(total_work / 60.0),
            total_pause_time_minutes: round2(total_pause),
            total_pause_time_hours: round2(total_pause / 60.0),
            pause_breakdown: PauseBreakdown::from_summary(&times),
        }
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 产量合计: 只统计 quantity_completed 存在且大于 0 的日志
fn production_total(logs: &[WorkLog]) -> i64 {
    logs.iter()
        .filter_map(|log| log.quantity_completed)
        .filter(|qty| *qty > 0)
        .sum()
}

/// 保留两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
