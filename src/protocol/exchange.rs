use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::message::{Message, MessageContent, MessageEnvelope};
use super::task::TaskRegistry;
use crate::agent::{AgentOutcome, AgentRegistry};
use crate::error::{LoanFlowError, Result};
use crate::ids::{AgentId, TaskId};

/// 智能体间的同步消息交换
///
/// 发送方等待接收方处理完毕；接收方失败时不记录任何消息。
/// 同一任务上的并发发送按发起顺序串行投递，接收方处理消息时不能再向同一任务发送。
#[derive(Clone)]
pub struct MessageExchange {
    agents: Arc<AgentRegistry>,
    tasks: Arc<TaskRegistry>,
}

impl MessageExchange {
    pub fn new(agents: Arc<AgentRegistry>, tasks: Arc<TaskRegistry>) -> Self {
        Self { agents, tasks }
    }

    #[instrument(
        skip_all,
        fields(sender = %sender_id, recipient = %recipient_id, task_id = %task_id)
    )]
    pub async fn send(
        &self,
        sender_id: &AgentId,
        recipient_id: &AgentId,
        task_id: &TaskId,
        content: MessageContent,
    ) -> Result<AgentOutcome> {
        let sender = self
            .agents
            .get(sender_id)
            .map_err(|_| LoanFlowError::SenderNotFound(sender_id.clone()))?;
        let recipient = self
            .agents
            .get(recipient_id)
            .map_err(|_| LoanFlowError::RecipientNotFound(recipient_id.clone()))?;
        let delivery = self.tasks.delivery_lock(task_id)?;
        // 持锁直到请求与响应写入任务，消息顺序与发起顺序一致
        let _turn = delivery.lock().await;

        let request = Message::new(
            task_id.clone(),
            sender_id.clone(),
            recipient_id.clone(),
            content.clone(),
        );
        let envelope = MessageEnvelope {
            task_id: task_id.clone(),
            sender_id: sender_id.clone(),
            sender_name: sender.name().to_string(),
            recipient_id: recipient_id.clone(),
            timestamp: request.timestamp,
            content,
        };

        let outcome = match recipient.receive_message(envelope).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "Recipient failed; nothing recorded");
                return Err(err);
            }
        };

        let response = Message::new(
            task_id.clone(),
            recipient_id.clone(),
            sender_id.clone(),
            MessageContent::AgentResponse(outcome.clone()),
        );
        self.tasks.record_exchange(task_id, request, response)?;
        info!(success = outcome.is_success(), "Message delivered");
        Ok(outcome)
    }
}
