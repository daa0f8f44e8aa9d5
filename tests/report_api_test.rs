// ==========================================
// 报表 API 测试
// ==========================================
// 测试范围:
// 1. 日报产量/暂停原因聚合与 [0点, 次日0点) 窗口
// 2. 区间报双闭窗口（含结束日最后一微秒）
// 3. 角色门禁与无效日期输入
// ==========================================


use chrono::{TimeZone, Utc};
use shopfloor_mes::api::ApiError;
use shopfloor_mes::domain::types::{PauseReason, UserRole, WorkLogEventType};
use shopfloor_mes::domain::work_log::WorkLog;
use shopfloor_mes::repository::WorkLogRepository;

use test_helpers::{create_test_state, current, seed_user};

/// 在指定时刻直接落一条日志
fn insert_log(
    repo: &WorkLogRepository,
    worker_id: &str,
    timestamp: chrono::DateTime<Utc>,
    event_type: WorkLogEventType,
    pause_reason: Option<PauseReason>,
    quantity: Option<i64>,
) {
    let mut log = WorkLog::new(
        "T001".to_string(),
        worker_id.to_string(),
        "M001".to_string(),
        event_type,
    )
    .with_pause_reason(pause_reason)
    .with_quantity_completed(quantity);
    log.timestamp = timestamp;
    repo.insert(&log).expect("插入日志失败");
}

/// 测试: 日报只统计 quantity_completed 存在且大于 0 的日志
#[test]
fn test_daily_report_production_sum() {
    let (_temp, db_path, state) = create_test_state();
    let admin = seed_user(&db_path, "admin", "admin123", UserRole::Admin);
    let worker = seed_user(&db_path, "operator1", "operator123", UserRole::Worker);
    let admin = current(&admin);

    let repo = WorkLogRepository::new(&db_path).unwrap();
    let day = |h, m| Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap();

    insert_log(&repo, &worker.id, day(8, 0), WorkLogEventType::WorkStart, None, None);
    insert_log(
        &repo,
        &worker.id,
        day(10, 0),
        WorkLogEventType::WorkComplete,
        None,
        Some(10),
    );
    // 数量为 0: 不计入产量
    insert_log(
        &repo,
        &worker.id,
        day(11, 0),
        WorkLogEventType::WorkComplete,
        None,
        Some(0),
    );
    insert_log(
        &repo,
        &worker.id,
        day(12, 0),
        WorkLogEventType::WorkComplete,
        None,
        Some(5),
    );

    let report = state.report_api.daily(&admin, "2025-06-02").unwrap();
    assert_eq!(report.total_production, 15);
    assert_eq!(report.total_logs, 4);
    assert_eq!(report.date, "2025-06-02");
}

/// 测试: 暂停原因计数，缺失原因计入 "unknown"
#[test]
fn test_daily_report_pause_reason_tally() {
    let (_temp, db_path, state) = create_test_state();
    let admin = seed_user(&db_path, "admin", "admin123", UserRole::Admin);
    let worker = seed_user(&db_path, "operator1", "operator123", UserRole::Worker);
    let admin = current(&admin);

    let repo = WorkLogRepository::new(&db_path).unwrap();
    let day = |h| Utc.with_ymd_and_hms(2025, 6, 2, h, 0, 0).unwrap();

    insert_log(
        &repo,
        &worker.id,
        day(8),
        WorkLogEventType::WorkPause,
        Some(PauseReason::Meal),
        None,
    );
    insert_log(
        &repo,
        &worker.id,
        day(9),
        WorkLogEventType::WorkPause,
        Some(PauseReason::Meal),
        None,
    );
    insert_log(
        &repo,
        &worker.id,
        day(10),
        WorkLogEventType::WorkPause,
        Some(PauseReason::MaterialShortage),
        None,
    );
    // 无原因: unknown
    insert_log(&repo, &worker.id, day(11), WorkLogEventType::WorkPause, None, None);
    // 非 pause 事件不计入
    insert_log(&repo, &worker.id, day(12), WorkLogEventType::WorkResume, None, None);

    let report = state.report_api.daily(&admin, "2025-06-02").unwrap();
    assert_eq!(report.pause_reasons.get("meal"), Some(&2));
    assert_eq!(report.pause_reasons.get("material_shortage"), Some(&1));
    assert_eq!(report.pause_reasons.get("unknown"), Some(&1));
    assert_eq!(report.pause_reasons.len(), 3);
}

/// 测试: 日报窗口左闭右开，次日 0 点的日志不计入
#[test]
fn test_daily_report_window_is_half_open() {
    let (_temp, db_path, state) = create_test_state();
    let admin = seed_user(&db_path, "admin", "admin123", UserRole::Admin);
    let worker = seed_user(&db_path, "operator1", "operator123", UserRole::Worker);
    let admin = current(&admin);

    let repo = WorkLogRepository::new(&db_path).unwrap();
    // 当日 0 点整: 计入
    insert_log(
        &repo,
        &worker.id,
        Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        WorkLogEventType::WorkComplete,
        None,
        Some(1),
    );
    // 次日 0 点整: 不计入
    insert_log(
        &repo,
        &worker.id,
        Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap(),
        WorkLogEventType::WorkComplete,
        None,
        Some(100),
    );

    let report = state.report_api.daily(&admin, "2025-06-02").unwrap();
    assert_eq!(report.total_logs, 1);
    assert_eq!(report.total_production, 1);
}

/// 测试: 区间报双闭，结束日 23:59:59 的日志计入
#[test]
fn test_range_report_includes_end_of_day() {
    let (_temp, db_path, state) = create_test_state();
    let admin = seed_user(&db_path, "admin", "admin123", UserRole::Admin);
    let worker = seed_user(&db_path, "operator1", "operator123", UserRole::Worker);
    let admin = current(&admin);

    let repo = WorkLogRepository::new(&db_path).unwrap();
    insert_log(
        &repo,
        &worker.id,
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        WorkLogEventType::WorkComplete,
        None,
        Some(3),
    );
    // 结束日最后一秒: 计入
    insert_log(
        &repo,
        &worker.id,
        Utc.with_ymd_and_hms(2025, 6, 8, 23, 59, 59).unwrap(),
        WorkLogEventType::WorkComplete,
        None,
        Some(4),
    );
    // 区间外次日: 不计入
    insert_log(
        &repo,
        &worker.id,
        Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 1).unwrap(),
        WorkLogEventType::WorkComplete,
        None,
        Some(100),
    );

    let report = state
        .report_api
        .range(&admin, "2025-06-02", "2025-06-08")
        .unwrap();
    assert_eq!(report.total_logs, 2);
    assert_eq!(report.total_production, 7);
}

/// 测试: 报表接口仅管理员可用
#[test]
fn test_reports_are_admin_only() {
    let (_temp, db_path, state) = create_test_state();
    let supervisor = seed_user(&db_path, "foreman1", "foreman123", UserRole::Supervisor);
    let worker = seed_user(&db_path, "operator1", "operator123", UserRole::Worker);
    let supervisor = current(&supervisor);
    let worker = current(&worker);

    assert!(matches!(
        state.report_api.daily(&worker, "2025-06-02"),
        Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
        state.report_api.range(&supervisor, "2025-06-02", "2025-06-08"),
        Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
        state
            .report_api
            .worker_performance(&worker, &worker.id, "2025-06-02", "2025-06-08"),
        Err(ApiError::Forbidden(_))
    ));
}

/// 测试: 无效日期与倒置区间 → InvalidInput
#[test]
fn test_invalid_date_inputs() {
    let (_temp, db_path, state) = create_test_state();
    let admin = seed_user(&db_path, "admin", "admin123", UserRole::Admin);
    let admin = current(&admin);

    assert!(matches!(
        state.report_api.daily(&admin, "2025-13-40"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        state.report_api.daily(&admin, "not-a-date"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        state.report_api.range(&admin, "2025-06-08", "2025-06-02"),
        Err(ApiError::InvalidInput(_))
    ));
}

/// 测试: 绩效报表的操作工必须存在
#[test]
fn test_worker_performance_requires_existing_worker() {
    let (_temp, db_path, state) = create_test_state();
    let admin = seed_user(&db_path, "admin", "admin123", UserRole::Admin);
    let admin = current(&admin);

    assert!(matches!(
        state
            .report_api
            .worker_performance(&admin, "no-such-worker", "2025-06-02", "2025-06-08"),
        Err(ApiError::NotFound(_))
    ));
}
