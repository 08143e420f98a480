use crate::errors::Result;

#[async_trait::async_trait]
pub trait EventListener {
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self);
    async fn is_running(&self) -> bool;
}
