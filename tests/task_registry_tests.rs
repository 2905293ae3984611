use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use loanflow::{
    Agent, AgentId, AgentIdentity, AgentKind, AgentOutcome, AgentRegistry, LoanFlowError,
    LoanId, MessageContent, TaskId, TaskPayload, TaskRegistry, TaskStatus, TaskType,
};

struct IdleAgent(AgentIdentity);

#[async_trait]
impl Agent for IdleAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.0
    }

    fn kind(&self) -> AgentKind {
        AgentKind::DocumentVerification
    }

    async fn process(
        &self,
        _input: MessageContent,
        _context_id: Option<LoanId>,
    ) -> loanflow::Result<AgentOutcome> {
        Ok(AgentOutcome::error("idle"))
    }
}

fn setup() -> (TaskRegistry, AgentId, AgentId) {
    let agents = Arc::new(AgentRegistry::new());
    let a = agents
        .register(Arc::new(IdleAgent(AgentIdentity::new("a", "a"))))
        .unwrap();
    let b = agents
        .register(Arc::new(IdleAgent(AgentIdentity::new("b", "b"))))
        .unwrap();
    (TaskRegistry::new(agents), a, b)
}

fn payload(loan_id: LoanId) -> TaskPayload {
    TaskPayload::DocumentVerificationNeeded {
        loan_application_id: loan_id,
    }
}

#[test]
fn create_task_starts_created() {
    let (tasks, initiator, _) = setup();
    let id = tasks.create_task(payload(42), &initiator);

    let task = tasks.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Created);
    assert_eq!(task.task_type, TaskType::DocumentVerificationNeeded);
    assert_eq!(task.payload.loan_application_id(), 42);
    assert_eq!(task.initiator_agent_id, initiator);
    assert!(task.assigned_agent_id.is_none());
    assert!(task.messages.is_empty());
    assert!(task.result.is_none());
    assert_eq!(task.created_at, task.updated_at);
}

#[test]
fn task_ids_are_unique() {
    let (tasks, initiator, _) = setup();
    let first = tasks.create_task(payload(1), &initiator);
    let second = tasks.create_task(payload(1), &initiator);
    assert_ne!(first, second);
    assert_eq!(tasks.len(), 2);
}

#[test]
fn assign_sets_status_and_agent() {
    let (tasks, initiator, worker) = setup();
    let id = tasks.create_task(payload(1), &initiator);
    tasks.assign(&id, &worker).unwrap();

    let task = tasks.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Assigned);
    assert_eq!(task.assigned_agent_id, Some(worker));
    assert!(task.updated_at >= task.created_at);
}

#[test]
fn assign_rejects_unknown_ids() {
    let (tasks, initiator, worker) = setup();
    let id = tasks.create_task(payload(1), &initiator);

    let missing_task = TaskId::from("missing");
    assert!(matches!(
        tasks.assign(&missing_task, &worker),
        Err(LoanFlowError::TaskNotFound(_))
    ));
    assert!(matches!(
        tasks.assign(&id, &AgentId::from("ghost")),
        Err(LoanFlowError::AgentNotFound(_))
    ));
    assert_eq!(tasks.get(&id).unwrap().status, TaskStatus::Created);
}

#[test]
fn reassignment_overwrites() {
    let (tasks, first, second) = setup();
    let id = tasks.create_task(payload(1), &first);
    tasks.assign(&id, &first).unwrap();
    tasks.assign(&id, &second).unwrap();
    assert_eq!(tasks.get(&id).unwrap().assigned_agent_id, Some(second));
}

#[test]
fn complete_after_assign_stores_result() {
    let (tasks, initiator, worker) = setup();
    let id = tasks.create_task(payload(5), &initiator);
    tasks.assign(&id, &worker).unwrap();
    let result = AgentOutcome::success("done", Some(5));
    tasks.complete(&id, result.clone()).unwrap();

    let task = tasks.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.result, Some(result));
}

#[test]
fn complete_without_assign_is_allowed() {
    let (tasks, initiator, _) = setup();
    let id = tasks.create_task(payload(5), &initiator);
    let result = AgentOutcome::error("gave up");
    tasks.complete(&id, result.clone()).unwrap();

    let task = tasks.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.result, Some(result));
    assert!(task.assigned_agent_id.is_none());
}

#[test]
fn complete_unknown_task_fails() {
    let (tasks, _, _) = setup();
    assert!(matches!(
        tasks.complete(&TaskId::from("missing"), AgentOutcome::error("x")),
        Err(LoanFlowError::TaskNotFound(_))
    ));
}

#[test]
fn prune_completed_only_removes_old_completed_tasks() {
    let (tasks, initiator, _) = setup();
    let done = tasks.create_task(payload(1), &initiator);
    let open = tasks.create_task(payload(2), &initiator);
    tasks.complete(&done, AgentOutcome::success("ok", None)).unwrap();

    assert_eq!(tasks.prune_completed(Utc::now() - Duration::hours(1)), 0);
    assert_eq!(tasks.prune_completed(Utc::now() + Duration::seconds(1)), 1);
    assert!(tasks.get(&done).is_err());
    assert!(!tasks.contains(&done));
    assert!(tasks.contains(&open));
}

#[test]
fn list_returns_tasks_in_creation_order() {
    let (tasks, initiator, _) = setup();
    let ids: Vec<_> = (1..=3)
        .map(|loan_id| tasks.create_task(payload(loan_id), &initiator))
        .collect();

    let listed: Vec<_> = tasks.list().into_iter().map(|task| task.task_id).collect();
    assert_eq!(listed.len(), 3);
    for id in &ids {
        assert!(listed.contains(id));
    }
    let created: Vec<_> = tasks.list().iter().map(|task| task.created_at).collect();
    assert!(created.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assign_and_complete_keep_every_result() {
    let (tasks, initiator, worker) = setup();
    let tasks = Arc::new(tasks);
    let ids: Vec<_> = (0..64)
        .map(|loan_id| tasks.create_task(payload(loan_id), &initiator))
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, id)| {
            let tasks = Arc::clone(&tasks);
            let worker = worker.clone();
            tokio::spawn(async move {
                tasks.assign(&id, &worker)?;
                tokio::task::yield_now().await;
                tasks.complete(&id, AgentOutcome::success("done", Some(index as LoanId)))
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(tasks.len(), 64);
    for (index, id) in ids.iter().enumerate() {
        let task = tasks.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.assigned_agent_id.as_ref(), Some(&worker));
        assert_eq!(
            task.result.and_then(|result| result.loan_application_id()),
            Some(index as LoanId)
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creation_yields_distinct_tasks() {
    let (tasks, initiator, _) = setup();
    let tasks = Arc::new(tasks);

    let handles: Vec<_> = (0..32)
        .map(|loan_id| {
            let tasks = Arc::clone(&tasks);
            let initiator = initiator.clone();
            tokio::spawn(async move { tasks.create_task(payload(loan_id), &initiator) })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 32);
    assert_eq!(tasks.list().len(), 32);
}
