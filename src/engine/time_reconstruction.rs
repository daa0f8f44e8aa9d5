// ==========================================
// 车间生产执行跟踪系统 - 工时重建引擎
// ==========================================
// 职责: 回放单个任务按时间排序的工作日志，重建
//       准备时长 / 生产时长 / 按原因分桶的暂停时长（分钟）
// 算法: 单向扫描，只看紧邻的下一条日志（前瞻恰好为 1）:
//       - prep_start + prep_end               → 准备时长
//       - work_start|work_resume + work_pause|work_complete → 生产时长
//       - work_pause + work_resume            → 暂停时长（按原因分桶）
//       - 其余情况（后继缺失或乱序）游标前进 1，不计任何时长
// 红线: 严格配对相邻事件；不允许跨间隙推断时长
// ==========================================

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::types::{PauseReason, WorkLogEventType};
use crate::domain::work_log::WorkLog;

// ==========================================
// WorkerTimeSummary - 工时重建结果
// ==========================================

/// 工时重建结果（单任务或跨任务合并后）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerTimeSummary {
    /// 准备时长（分钟）
    pub prep_minutes: f64,
    /// 生产时长（分钟）
    pub work_minutes: f64,
    /// 暂停时长（分钟，按原因分桶）
    pub pause_minutes_by_reason: HashMap<PauseReason, f64>,
}

impl WorkerTimeSummary {
    /// 总工作时长 = 准备 + 生产
    pub fn total_work_minutes(&self) -> f64 {
        self.prep_minutes + self.work_minutes
    }

    /// 总暂停时长 = 全部原因分桶之和
    pub fn total_pause_minutes(&self) -> f64 {
        self.pause_minutes_by_reason.values().sum()
    }

    /// 读取指定原因的暂停时长（无记录则为 0）
    pub fn pause_minutes(&self, reason: PauseReason) -> f64 {
        self.pause_minutes_by_reason
            .get(&reason)
            .copied()
            .unwrap_or(0.0)
    }

    /// 合并另一个重建结果（跨任务汇总用）
    pub fn merge(&mut self, other: &WorkerTimeSummary) {
        self.prep_minutes += other.prep_minutes;
        self.work_minutes += other.work_minutes;
        for (reason, minutes) in &other.pause_minutes_by_reason {
            *self.pause_minutes_by_reason.entry(*reason).or_insert(0.0) += minutes;
        }
    }
}

// ==========================================
// TimeReconstructionEngine - 工时重建引擎
// ==========================================
pub struct TimeReconstructionEngine;

impl TimeReconstructionEngine {
    /// 创建新的工时重建引擎
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 重建单个任务的工时
    ///
    /// 输入无需预排序，内部按时间戳升序排序后扫描
    pub fn reconstruct_task(&self, logs: &[WorkLog]) -> WorkerTimeSummary {
        let mut ordered: Vec<&WorkLog> = logs.iter().collect();
        ordered.sort_by_key(|log| log.timestamp);

        let mut summary = WorkerTimeSummary::default();
        let mut i = 0;
        while i < ordered.len() {
            let current = ordered[i];
            let next = ordered.get(i + 1);

            match current.event_type {
                WorkLogEventType::PrepStart => {
                    if let Some(next) = next {
                        if next.event_type == WorkLogEventType::PrepEnd {
                            summary.prep_minutes += minutes_between(current, next);
                            i += 2;
                            continue;
                        }
                    }
                }
                WorkLogEventType::WorkStart | WorkLogEventType::WorkResume => {
                    if let Some(next) = next {
                        if matches!(
                            next.event_type,
                            WorkLogEventType::WorkPause | WorkLogEventType::WorkComplete
                        ) {
                            summary.work_minutes += minutes_between(current, next);
                            i += 2;
                            continue;
                        }
                    }
                }
                WorkLogEventType::WorkPause => {
                    if let Some(next) = next {
                        if next.event_type == WorkLogEventType::WorkResume {
                            let reason = current.pause_reason.unwrap_or(PauseReason::Break);
                            *summary
                                .pause_minutes_by_reason
                                .entry(reason)
                                .or_insert(0.0) += minutes_between(current, next);
                            i += 2;
                            continue;
                        }
                    }
                }
                _ => {}
            }

            // 无合格后继: 该条不贡献任何时长，游标前进 1
            i += 1;
        }

        summary
    }

    /// 重建一名操作工在一组任务上的工时（逐任务重建后合并）
    ///
    /// # 参数
    /// - task_ids: 操作工涉及的任务集合（由其日志流的 task_id 去重得到）
    /// - logs: 操作工时间窗口内的全部日志
    #[instrument(skip(self, task_ids, logs), fields(tasks = task_ids.len(), logs = logs.len()))]
    pub fn reconstruct_worker(&self, task_ids: &[String], logs: &[WorkLog]) -> WorkerTimeSummary {
        let mut total = WorkerTimeSummary::default();
        for task_id in task_ids {
            let task_logs: Vec<WorkLog> = logs
                .iter()
                .filter(|log| &log.task_id == task_id)
                .cloned()
                .collect();
            let summary = self.reconstruct_task(&task_logs);
            total.merge(&summary);
        }
        total
    }
}

impl Default for TimeReconstructionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 相邻两条日志的时间差（分钟）
fn minutes_between(start: &WorkLog, end: &WorkLog) -> f64 {
    (end.timestamp - start.timestamp).num_milliseconds() as f64 / 60_000.0
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// 在基准时刻 + offset 分钟处构造一条日志
    fn log_at(minutes: i64, event_type: WorkLogEventType) -> WorkLog {
        let base = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let mut log = WorkLog::new(
            "T001".to_string(),
            "W001".to_string(),
            "M001".to_string(),
            event_type,
        );
        log.timestamp = base + Duration::minutes(minutes);
        log
    }

    #[test]
    fn test_full_sequence_reconstruction() {
        // prep 0-5, work 5-20, pause(break) 20-25, work 25-40
        let logs = vec![
            log_at(0, WorkLogEventType::PrepStart),
            log_at(5, WorkLogEventType::PrepEnd),
            log_at(5, WorkLogEventType::WorkStart),
            log_at(20, WorkLogEventType::WorkPause)
                .with_pause_reason(Some(PauseReason::Break)),
            log_at(25, WorkLogEventType::WorkResume),
            log_at(40, WorkLogEventType::WorkComplete).with_quantity_completed(Some(10)),
        ];

        let engine = TimeReconstructionEngine::new();
        let summary = engine.reconstruct_task(&logs);

        assert_eq!(summary.prep_minutes, 5.0);
        assert_eq!(summary.work_minutes, 30.0);
        assert_eq!(summary.pause_minutes(PauseReason::Break), 5.0);
        assert_eq!(summary.total_work_minutes(), 35.0);
        assert_eq!(summary.total_pause_minutes(), 5.0);
    }

    #[test]
    fn test_unmatched_pause_pair_is_skipped() {
        // 两条连续 work_pause，中间无 resume: 不计任何暂停时长
        let logs = vec![
            log_at(0, WorkLogEventType::WorkPause).with_pause_reason(Some(PauseReason::Break)),
            log_at(5, WorkLogEventType::WorkPause)
                .with_pause_reason(Some(PauseReason::Failure)),
        ];

        let engine = TimeReconstructionEngine::new();
        let summary = engine.reconstruct_task(&logs);

        assert_eq!(summary.total_pause_minutes(), 0.0);
        assert_eq!(summary.prep_minutes, 0.0);
        assert_eq!(summary.work_minutes, 0.0);
    }

    #[test]
    fn test_unterminated_work_start_contributes_nothing() {
        let logs = vec![
            log_at(0, WorkLogEventType::PrepStart),
            log_at(5, WorkLogEventType::PrepEnd),
            log_at(5, WorkLogEventType::WorkStart),
        ];

        let engine = TimeReconstructionEngine::new();
        let summary = engine.reconstruct_task(&logs);

        assert_eq!(summary.prep_minutes, 5.0);
        assert_eq!(summary.work_minutes, 0.0);
    }

    #[test]
    fn test_pause_without_reason_defaults_to_break() {
        let logs = vec![
            log_at(0, WorkLogEventType::WorkPause),
            log_at(7, WorkLogEventType::WorkResume),
        ];

        let engine = TimeReconstructionEngine::new();
        let summary = engine.reconstruct_task(&logs);

        assert_eq!(summary.pause_minutes(PauseReason::Break), 7.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_scan() {
        let logs = vec![
            log_at(5, WorkLogEventType::PrepEnd),
            log_at(0, WorkLogEventType::PrepStart),
        ];

        let engine = TimeReconstructionEngine::new();
        let summary = engine.reconstruct_task(&logs);

        assert_eq!(summary.prep_minutes, 5.0);
    }

    #[test]
    fn test_worker_aggregation_across_tasks() {
        let mut logs = vec![
            log_at(0, WorkLogEventType::WorkStart),
            log_at(10, WorkLogEventType::WorkComplete),
        ];
        let mut other = vec![
            log_at(20, WorkLogEventType::WorkStart),
            log_at(35, WorkLogEventType::WorkComplete),
        ];
        for log in &mut other {
            log.task_id = "T002".to_string();
        }
        logs.append(&mut other);

        let engine = TimeReconstructionEngine::new();
        let summary =
            engine.reconstruct_worker(&["T001".to_string(), "T002".to_string()], &logs);

        assert_eq!(summary.work_minutes, 25.0);
    }
}
