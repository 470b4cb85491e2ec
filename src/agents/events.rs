use crate::types::AgentEvent;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Broadcast bus carrying pipeline lifecycle events. Consumers subscribe
/// for real-time delivery; a bounded history is kept for inspection after
/// a run.
pub struct EventBus {
    event_sender: broadcast::Sender<AgentEvent>,
    event_history: Arc<RwLock<Vec<AgentEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(1000);

        Self {
            event_sender,
            event_history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: AgentEvent) -> Result<()> {
        debug!(
            "Publishing event: {} from agent: {}",
            event.event_type, event.agent_name
        );

        // Store in history
        {
            let mut history = self.event_history.write().await;
            history.push(event.clone());

            // Keep only the most recent events to prevent memory growth
            if history.len() > 10000 {
                history.drain(0..1000);
            }
        }

        // Broadcast to subscribers
        match self.event_sender.send(event) {
            Ok(subscriber_count) => {
                debug!("Event broadcast to {} subscribers", subscriber_count);
            }
            Err(_) => {
                debug!("No active subscribers for event");
            }
        }

        Ok(())
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.event_sender.subscribe()
    }

    /// Get event history filtered by agent name and/or event type
    pub async fn get_event_history(
        &self,
        agent_name: Option<&str>,
        event_type: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<AgentEvent> {
        let history = self.event_history.read().await;

        let filtered: Vec<AgentEvent> = history
            .iter()
            .filter(|event| {
                if let Some(name) = agent_name {
                    if event.agent_name != name {
                        return false;
                    }
                }

                if let Some(event_t) = event_type {
                    if event.event_type != event_t {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        if let Some(limit) = limit {
            filtered.into_iter().rev().take(limit).collect()
        } else {
            filtered
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.event_sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
