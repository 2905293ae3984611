use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::message::Message;
use crate::agent::{AgentOutcome, AgentRegistry};
use crate::error::{LoanFlowError, Result};
use crate::ids::{AgentId, TaskId};
use crate::store::LoanId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    Assigned,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    DocumentVerificationNeeded,
}

/// 任务负载，变体决定任务类型
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPayload {
    DocumentVerificationNeeded { loan_application_id: LoanId },
}

impl TaskPayload {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskPayload::DocumentVerificationNeeded { .. } => TaskType::DocumentVerificationNeeded,
        }
    }

    pub fn loan_application_id(&self) -> LoanId {
        match self {
            TaskPayload::DocumentVerificationNeeded {
                loan_application_id,
            } => *loan_application_id,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub task_type: TaskType,
    pub payload: TaskPayload,
    pub status: TaskStatus,
    pub initiator_agent_id: AgentId,
    pub assigned_agent_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AgentOutcome>,
}

/// 任务注册表
///
/// 生命周期刻意保持宽松：未分配的任务也可以完成，重复分配直接覆盖。
/// 每个任务另有一把投递锁，同一任务上的消息按发起顺序逐条投递。
pub struct TaskRegistry {
    agents: Arc<AgentRegistry>,
    tasks: RwLock<HashMap<TaskId, Task>>,
    delivery: Mutex<HashMap<TaskId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TaskRegistry {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self {
            agents,
            tasks: RwLock::new(HashMap::new()),
            delivery: Mutex::new(HashMap::new()),
        }
    }

    /// 调用方负责保证 `initiator` 已注册
    pub fn create_task(&self, payload: TaskPayload, initiator: &AgentId) -> TaskId {
        let task_id = TaskId::generate();
        let now = Utc::now();
        let task = Task {
            task_id: task_id.clone(),
            task_type: payload.task_type(),
            payload,
            status: TaskStatus::Created,
            initiator_agent_id: initiator.clone(),
            assigned_agent_id: None,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            result: None,
        };
        debug!(task_id = %task_id, task_type = ?task.task_type, "Task created");
        self.tasks.write().insert(task_id.clone(), task);
        self.delivery
            .lock()
            .insert(task_id.clone(), Arc::new(tokio::sync::Mutex::new(())));
        task_id
    }

    pub fn assign(&self, task_id: &TaskId, agent_id: &AgentId) -> Result<()> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| LoanFlowError::TaskNotFound(task_id.clone()))?;
        if !self.agents.contains(agent_id) {
            return Err(LoanFlowError::AgentNotFound(agent_id.clone()));
        }
        if let Some(previous) = task.assigned_agent_id.as_ref().filter(|prev| *prev != agent_id) {
            debug!(task_id = %task_id, from = %previous, to = %agent_id, "Task reassigned");
        }
        task.assigned_agent_id = Some(agent_id.clone());
        task.status = TaskStatus::Assigned;
        task.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&self, task_id: &TaskId, result: AgentOutcome) -> Result<()> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| LoanFlowError::TaskNotFound(task_id.clone()))?;
        if task.assigned_agent_id.is_none() {
            warn!(task_id = %task_id, "Completing a task that was never assigned");
        }
        task.status = TaskStatus::Completed;
        task.result = Some(result);
        task.updated_at = Utc::now();
        info!(task_id = %task_id, "Task completed");
        Ok(())
    }

    pub fn get(&self, task_id: &TaskId) -> Result<Task> {
        self.tasks
            .read()
            .get(task_id)
            .cloned()
            .ok_or_else(|| LoanFlowError::TaskNotFound(task_id.clone()))
    }

    pub fn messages(&self, task_id: &TaskId) -> Result<Vec<Message>> {
        self.tasks
            .read()
            .get(task_id)
            .map(|task| task.messages.clone())
            .ok_or_else(|| LoanFlowError::TaskNotFound(task_id.clone()))
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.tasks.read().contains_key(task_id)
    }

    /// 按创建时间排序的全部任务
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().values().cloned().collect();
        tasks.sort_by_key(|task| task.created_at);
        tasks
    }

    /// 任务的投递锁；tokio 的 Mutex 按等待顺序放行
    pub(crate) fn delivery_lock(&self, task_id: &TaskId) -> Result<Arc<tokio::sync::Mutex<()>>> {
        self.delivery
            .lock()
            .get(task_id)
            .cloned()
            .ok_or_else(|| LoanFlowError::TaskNotFound(task_id.clone()))
    }

    /// 请求与响应在同一临界区内追加，保证二者相邻
    pub(crate) fn record_exchange(
        &self,
        task_id: &TaskId,
        request: Message,
        response: Message,
    ) -> Result<()> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| LoanFlowError::TaskNotFound(task_id.clone()))?;
        task.messages.push(request);
        task.messages.push(response);
        task.updated_at = Utc::now();
        Ok(())
    }

    /// 删除在 `before` 之前完成的任务，返回删除数量
    pub fn prune_completed(&self, before: DateTime<Utc>) -> usize {
        let mut tasks = self.tasks.write();
        let initial = tasks.len();
        tasks.retain(|_, task| task.status != TaskStatus::Completed || task.updated_at >= before);
        self.delivery.lock().retain(|task_id, _| tasks.contains_key(task_id));
        let pruned = initial - tasks.len();
        if pruned > 0 {
            info!(pruned, "Pruned completed tasks");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}
