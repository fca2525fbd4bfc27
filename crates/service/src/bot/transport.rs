use async_trait::async_trait;

use crate::bot::inbound::Reply;
use crate::errors::ServiceError;

/// Outbound delivery seam. Implementations talk to a chat API; tests record.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, reply: &Reply) -> Result<(), ServiceError>;
}
