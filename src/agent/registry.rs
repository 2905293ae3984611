use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::agent::{Agent, AgentCard};
use crate::error::{LoanFlowError, Result};
use crate::ids::AgentId;

#[derive(Clone)]
struct AgentEntry {
    agent: Arc<dyn Agent>,
    card: AgentCard,
}

/// 智能体注册表
///
/// 按注册顺序保存；同一标识重复注册会被拒绝。
#[derive(Default)]
pub struct AgentRegistry {
    entries: RwLock<Vec<AgentEntry>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, agent: Arc<dyn Agent>) -> Result<AgentId> {
        let card = agent.card();
        let mut entries = self.entries.write();
        if entries.iter().any(|entry| entry.card.id == card.id) {
            return Err(LoanFlowError::DuplicateAgent(card.id));
        }
        info!(agent_id = %card.id, name = %card.name, "Agent registered");
        let id = card.id.clone();
        entries.push(AgentEntry { agent, card });
        Ok(id)
    }

    /// 线性扫描，返回第一个具备该能力的智能体
    pub fn find_by_capability(&self, capability: &str) -> Option<AgentId> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.card.capabilities.iter().any(|c| c == capability))
            .map(|entry| entry.card.id.clone())
    }

    pub fn get(&self, id: &AgentId) -> Result<Arc<dyn Agent>> {
        self.entries
            .read()
            .iter()
            .find(|entry| &entry.card.id == id)
            .map(|entry| Arc::clone(&entry.agent))
            .ok_or_else(|| LoanFlowError::AgentNotFound(id.clone()))
    }

    pub fn card(&self, id: &AgentId) -> Result<AgentCard> {
        self.entries
            .read()
            .iter()
            .find(|entry| &entry.card.id == id)
            .map(|entry| entry.card.clone())
            .ok_or_else(|| LoanFlowError::AgentNotFound(id.clone()))
    }

    pub fn cards(&self) -> Vec<AgentCard> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.card.clone())
            .collect()
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.entries.read().iter().any(|entry| &entry.card.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
