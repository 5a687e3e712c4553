use crate::services::base::status::Status;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Request-scoped information passed through the registry to the storage backend.
/// The registry never inspects or alters it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub namespace: Option<String>,
    pub user: Option<String>,
    pub deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            namespace: None,
            user: None,
            deadline: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn check_deadline(&self) -> Result<(), Status> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Status::Timeout(format!(
                "Request {} exceeded its deadline",
                self.request_id
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
