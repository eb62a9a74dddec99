use std::sync::Arc;

use crate::error::Error;
use crate::transport::Transport;

use super::{invoke, invoke_raw};

/// Backend-level operations not tied to an entity.
#[derive(Clone)]
pub struct SystemController {
    transport: Arc<dyn Transport>,
}

impl SystemController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Returns `true` only if `health_check` resolved and reported success.
    ///
    /// Never fails: a rejected call and a broken channel both read as unhealthy.
    pub async fn health_check(&self) -> bool {
        match invoke_raw(self.transport.as_ref(), "health_check", ()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        }
    }

    pub async fn get_version(&self) -> Result<String, Error> {
        invoke(self.transport.as_ref(), "get_version", ()).await
    }
}
