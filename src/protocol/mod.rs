// 智能体间通信协议（任务 + 消息交换）

mod exchange;
mod message;
mod task;

pub use exchange::MessageExchange;
pub use message::{Message, MessageContent, MessageEnvelope};
pub use task::{Task, TaskPayload, TaskRegistry, TaskStatus, TaskType};

pub use crate::ids::{MessageId, TaskId};
