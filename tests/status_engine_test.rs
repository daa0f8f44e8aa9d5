// ==========================================
// 状态引擎级联测试
// ==========================================
// 测试范围:
// 1. 工作日志事件对任务/工单/机台的级联更新
// 2. 部分完成派生余量任务
// 3. 工单完成判定（先派生后判定的顺序）
// 4. 机台绑定全有或全无
// 5. 重复完成事件被拒绝（并发危害回归）
// ==========================================


use shopfloor_mes::api::{ApiError, CreateTaskRequest, CreateWorkLogRequest};
use shopfloor_mes::domain::types::{
    MachineStatus, PauseReason, TaskStatus, WorkLogEventType, WorkOrderStatus,
};
use shopfloor_mes::repository::{MachineRepository, TaskRepository, WorkOrderRepository};

use test_helpers::{create_test_state, current, seed_machine, seed_standard_users, seed_work_order};

/// 提交一条工作日志事件
fn submit_event(
    state: &shopfloor_mes::app::AppState,
    worker: &shopfloor_mes::api::CurrentUser,
    task_id: &str,
    event_type: WorkLogEventType,
    quantity: Option<i64>,
) -> Result<shopfloor_mes::domain::work_log::WorkLog, ApiError> {
    state.work_log_api.create(
        worker,
        CreateWorkLogRequest {
            task_id: task_id.to_string(),
            event_type,
            pause_reason: None,
            quantity_completed: quantity,
            notes: None,
        },
    )
}

// ==========================================
// 测试用例
// ==========================================

/// 测试: prep_start 置任务为 preparation 并绑定机台
#[test]
fn test_prep_start_cascade() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 100);
    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id.clone(),
                machine_id: machine.id.clone(),
                quantity_assigned: 100,
            },
        )
        .unwrap();

    // 分派后工单应为 assigned
    let order_repo = WorkOrderRepository::new(&db_path).unwrap();
    assert_eq!(
        order_repo.find_by_id(&order.id).unwrap().unwrap().status,
        WorkOrderStatus::Assigned
    );

    submit_event(&state, &worker, &task.id, WorkLogEventType::PrepStart, None).unwrap();

    let task_repo = TaskRepository::new(&db_path).unwrap();
    let machine_repo = MachineRepository::new(&db_path).unwrap();

    let task_now = task_repo.find_by_id(&task.id).unwrap().unwrap();
    assert_eq!(task_now.status, TaskStatus::Preparation);

    let machine_now = machine_repo.find_by_id(&machine.id).unwrap().unwrap();
    assert_eq!(machine_now.status, MachineStatus::Running);
    assert_eq!(machine_now.current_task_id.as_deref(), Some(task.id.as_str()));
    assert_eq!(machine_now.current_worker_id.as_deref(), Some(worker.id.as_str()));
    assert_eq!(
        machine_now.current_work_order_id.as_deref(),
        Some(order.id.as_str())
    );
    assert!(machine_now.binding_is_consistent());

    // prep_start 不改变工单状态
    assert_eq!(
        order_repo.find_by_id(&order.id).unwrap().unwrap().status,
        WorkOrderStatus::Assigned
    );
}

/// 测试: prep_end / work_pause / work_resume 的状态推导
#[test]
fn test_progress_pause_resume_cascade() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 100);
    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id.clone(),
                machine_id: machine.id.clone(),
                quantity_assigned: 100,
            },
        )
        .unwrap();

    let task_repo = TaskRepository::new(&db_path).unwrap();
    let machine_repo = MachineRepository::new(&db_path).unwrap();
    let order_repo = WorkOrderRepository::new(&db_path).unwrap();

    submit_event(&state, &worker, &task.id, WorkLogEventType::PrepStart, None).unwrap();
    submit_event(&state, &worker, &task.id, WorkLogEventType::PrepEnd, None).unwrap();

    assert_eq!(
        task_repo.find_by_id(&task.id).unwrap().unwrap().status,
        TaskStatus::InProgress
    );
    assert_eq!(
        order_repo.find_by_id(&order.id).unwrap().unwrap().status,
        WorkOrderStatus::InProgress
    );

    // 暂停: 任务 paused，机台 pause，工单不变，绑定保持
    state
        .work_log_api
        .create(
            &worker,
            CreateWorkLogRequest {
                task_id: task.id.clone(),
                event_type: WorkLogEventType::WorkPause,
                pause_reason: Some(PauseReason::Failure),
                quantity_completed: None,
                notes: Some("设备报警".to_string()),
            },
        )
        .unwrap();

    let machine_now = machine_repo.find_by_id(&machine.id).unwrap().unwrap();
    assert_eq!(
        task_repo.find_by_id(&task.id).unwrap().unwrap().status,
        TaskStatus::Paused
    );
    assert_eq!(machine_now.status, MachineStatus::Pause);
    assert!(machine_now.current_task_id.is_some());
    assert!(machine_now.binding_is_consistent());
    assert_eq!(
        order_repo.find_by_id(&order.id).unwrap().unwrap().status,
        WorkOrderStatus::InProgress
    );

    // 恢复: 任务 in_progress，机台 running
    submit_event(&state, &worker, &task.id, WorkLogEventType::WorkResume, None).unwrap();
    assert_eq!(
        task_repo.find_by_id(&task.id).unwrap().unwrap().status,
        TaskStatus::InProgress
    );
    assert_eq!(
        machine_repo.find_by_id(&machine.id).unwrap().unwrap().status,
        MachineStatus::Running
    );
}

/// 测试: 部分完成派生恰好一个余量任务，且工单不在同一事件内完成
#[test]
fn test_partial_complete_spawns_remainder_and_blocks_order_completion() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 100);
    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id.clone(),
                machine_id: machine.id.clone(),
                quantity_assigned: 100,
            },
        )
        .unwrap();

    submit_event(&state, &worker, &task.id, WorkLogEventType::WorkStart, None).unwrap();
    submit_event(
        &state,
        &worker,
        &task.id,
        WorkLogEventType::WorkComplete,
        Some(60),
    )
    .unwrap();

    let task_repo = TaskRepository::new(&db_path).unwrap();
    let all_tasks = task_repo.list().unwrap();
    assert_eq!(all_tasks.len(), 2, "应恰好存在原任务 + 一个余量任务");

    let completed = all_tasks.iter().find(|t| t.id == task.id).unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.quantity_completed, 60);

    let remainder = all_tasks.iter().find(|t| t.id != task.id).unwrap();
    assert_eq!(remainder.status, TaskStatus::Assigned);
    assert_eq!(remainder.quantity_assigned, 40);
    assert_eq!(remainder.assigned_worker_id, None);
    assert_eq!(remainder.work_order_id, order.id);
    assert_eq!(remainder.machine_id, machine.id);
    assert_eq!(remainder.assigned_by, task.assigned_by);

    // 刚派生的余量任务是 assigned，工单不得完成
    let order_repo = WorkOrderRepository::new(&db_path).unwrap();
    let order_now = order_repo.find_by_id(&order.id).unwrap().unwrap();
    assert_ne!(order_now.status, WorkOrderStatus::Completed);

    // 机台复位: idle + 三个绑定全空
    let machine_repo = MachineRepository::new(&db_path).unwrap();
    let machine_now = machine_repo.find_by_id(&machine.id).unwrap().unwrap();
    assert_eq!(machine_now.status, MachineStatus::Idle);
    assert!(machine_now.current_task_id.is_none());
    assert!(machine_now.current_worker_id.is_none());
    assert!(machine_now.current_work_order_id.is_none());

    // 完成余量任务后工单才完成
    submit_event(
        &state,
        &worker,
        &remainder.id,
        WorkLogEventType::WorkComplete,
        Some(40),
    )
    .unwrap();
    let order_now = order_repo.find_by_id(&order.id).unwrap().unwrap();
    assert_eq!(order_now.status, WorkOrderStatus::Completed);
}

/// 测试: 足量/超量完成不派生余量任务
#[test]
fn test_full_complete_spawns_no_remainder() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 50);
    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id.clone(),
                machine_id: machine.id.clone(),
                quantity_assigned: 50,
            },
        )
        .unwrap();

    submit_event(&state, &worker, &task.id, WorkLogEventType::WorkStart, None).unwrap();
    submit_event(
        &state,
        &worker,
        &task.id,
        WorkLogEventType::WorkComplete,
        Some(50),
    )
    .unwrap();

    let task_repo = TaskRepository::new(&db_path).unwrap();
    assert_eq!(task_repo.list().unwrap().len(), 1, "不应派生余量任务");

    // 唯一任务完成 → 工单完成
    let order_repo = WorkOrderRepository::new(&db_path).unwrap();
    assert_eq!(
        order_repo.find_by_id(&order.id).unwrap().unwrap().status,
        WorkOrderStatus::Completed
    );
}

/// 测试: 重复 work_complete 被拒绝，不会二次派生余量任务
///
/// 同任务的并发/重复提交是本系统的主要并发危害，
/// 引擎以"终态任务拒绝事件"作为幂等闸门
#[test]
fn test_duplicate_work_complete_cannot_double_spawn_remainder() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 100);
    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id.clone(),
                machine_id: machine.id.clone(),
                quantity_assigned: 100,
            },
        )
        .unwrap();

    submit_event(&state, &worker, &task.id, WorkLogEventType::WorkStart, None).unwrap();
    submit_event(
        &state,
        &worker,
        &task.id,
        WorkLogEventType::WorkComplete,
        Some(60),
    )
    .unwrap();

    // 第二次完成: 拒绝
    let result = submit_event(
        &state,
        &worker,
        &task.id,
        WorkLogEventType::WorkComplete,
        Some(60),
    );
    assert!(matches!(
        result,
        Err(ApiError::InvalidStateTransition { .. })
    ));

    // 仍然只有一个余量任务
    let task_repo = TaskRepository::new(&db_path).unwrap();
    assert_eq!(task_repo.list().unwrap().len(), 2);
}

/// 测试: 不存在的任务 → NotFound，且不产生任何日志
#[test]
fn test_event_for_missing_task_has_no_side_effects() {
    let (_temp, db_path, state) = create_test_state();
    let (_admin, _supervisor, worker) = seed_standard_users(&db_path);
    let worker = current(&worker);

    let result = submit_event(
        &state,
        &worker,
        "no-such-task",
        WorkLogEventType::PrepStart,
        None,
    );
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let logs = state
        .work_log_api
        .list_task_logs(&worker, "no-such-task")
        .unwrap();
    assert!(logs.is_empty());
}

/// 测试: 创建任务后立即撤回，机台复位为 idle 且三个绑定全空
#[test]
fn test_create_then_retract_resets_machine() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 100);
    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id.clone(),
                machine_id: machine.id.clone(),
                quantity_assigned: 100,
            },
        )
        .unwrap();

    // 让机台先绑定上
    submit_event(&state, &worker, &task.id, WorkLogEventType::PrepStart, None).unwrap();

    state.task_api.retract(&supervisor, &task.id).unwrap();

    let task_repo = TaskRepository::new(&db_path).unwrap();
    assert!(task_repo.find_by_id(&task.id).unwrap().is_none());

    let machine_repo = MachineRepository::new(&db_path).unwrap();
    let machine_now = machine_repo.find_by_id(&machine.id).unwrap().unwrap();
    assert_eq!(machine_now.status, MachineStatus::Idle);
    assert!(machine_now.current_task_id.is_none());
    assert!(machine_now.current_worker_id.is_none());
    assert!(machine_now.current_work_order_id.is_none());
}

/// 测试: 操作工无权分派/撤回任务
#[test]
fn test_task_write_operations_are_role_gated() {
    let (_temp, db_path, state) = create_test_state();
    let (admin, supervisor, worker) = seed_standard_users(&db_path);
    let (admin, supervisor, worker) = (current(&admin), current(&supervisor), current(&worker));

    let machine = seed_machine(&state, &admin, "车床1", "M001");
    let order = seed_work_order(&state, &supervisor, "WO-001", 100);

    let result = state.task_api.create(
        &worker,
        CreateTaskRequest {
            work_order_id: order.id.clone(),
            machine_id: machine.id.clone(),
            quantity_assigned: 100,
        },
    );
    assert!(matches!(result, Err(ApiError::Forbidden(_))));

    let task = state
        .task_api
        .create(
            &supervisor,
            CreateTaskRequest {
                work_order_id: order.id,
                machine_id: machine.id,
                quantity_assigned: 100,
            },
        )
        .unwrap();

    let result = state.task_api.retract(&worker, &task.id);
    assert!(matches!(result, Err(ApiError::Forbidden(_))));
}
