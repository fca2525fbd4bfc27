use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::bot::inbound::Inbound;
use crate::bot::router::MessageRouter;
use crate::bot::transport::ReplySender;

/// Drain the inbound queue one event at a time until every producer is gone.
/// Delivery failures are logged and the next event is processed.
pub async fn run(
    mut events: mpsc::Receiver<Inbound>,
    router: Arc<MessageRouter>,
    sender: Arc<dyn ReplySender>,
) {
    info!("update worker started");
    while let Some(event) = events.recv().await {
        let Some(reply) = router.handle(&event).await else {
            continue;
        };
        if let Err(e) = sender.send(&reply).await {
            error!(chat_id = reply.chat_id, error = %e, "failed to deliver reply");
        }
    }
    info!("update queue closed, worker stopping");
}
