//! Command metadata carried from the caller into emitted events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderId, UserId};

/// Who asked for a change and which request it belongs to.
///
/// License events published while handling a command carry the correlation
/// id and, for administrative commands, the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Administrator performing the change; `None` for automated sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    actor: Option<UserId>,

    correlation_id: String,

    /// Origin of the command, e.g. "order_sync" or "admin".
    source: String,
}

impl CommandMetadata {
    /// New metadata with a generated correlation id.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            actor: None,
            correlation_id: Uuid::new_v4().to_string(),
            source: source.into(),
        }
    }

    /// Metadata for work triggered by an order notification; correlates on
    /// the order id so every license event of one order groups together.
    pub fn for_order(order: OrderId) -> Self {
        Self {
            actor: None,
            correlation_id: order.to_string(),
            source: "order_sync".to_string(),
        }
    }

    /// Metadata for an administrator's command.
    pub fn for_admin(actor: UserId) -> Self {
        Self::new("admin").with_actor(actor)
    }

    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    pub fn actor(&self) -> Option<&UserId> {
        self.actor.as_ref()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
