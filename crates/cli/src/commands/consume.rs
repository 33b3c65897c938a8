use beacon_core::error::Result;
use beacon_core::messaging::consumer::{
    Disposition, MessageConsumer, MessageContext, MessageHandler,
};
use beacon_core::scope::TenantScope;
use tokio::sync::watch;
use tracing::info;

use super::AppContext;

/// Logs every message it receives. A stand-in handler that demonstrates
/// the consumer wiring end to end.
struct LoggingHandler;

#[async_trait::async_trait]
impl MessageHandler for LoggingHandler {
    async fn handle(
        &self,
        ctx: &MessageContext,
        scope: &TenantScope,
        payload: &[u8],
    ) -> Result<Disposition> {
        info!(
            kind = %ctx.kind,
            tenant_id = %scope.tenant_id(),
            correlation_id = %ctx.correlation_id,
            delivery_count = ctx.delivery_count,
            payload_bytes = payload.len(),
            "Received message"
        );
        Ok(Disposition::Handled)
    }
}

/// Run the `consume` command: pump one subscription until ctrl-c.
pub async fn run(config_path: &str, topic: &str, subscription: &str) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path).await?;

    let consumer =
        MessageConsumer::new(&ctx.broker, topic, subscription, Box::new(LoggingHandler)).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(consumer.run(shutdown_rx));

    println!("Consuming {topic}/{subscription} (ctrl-c to stop)...");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    worker.await??;
    println!("Consumer stopped.");
    Ok(())
}
