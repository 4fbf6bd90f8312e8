//! Audit log appender.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use tenderbox_core::{Actor, AuditEvent, AuditEventType, AuditLog};

/// Writes audit events; a failed append is logged and otherwise ignored.
#[derive(Clone)]
pub struct AuditAppender {
    log: Arc<dyn AuditLog>,
}

impl AuditAppender {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    pub async fn append(
        &self,
        event_type: AuditEventType,
        actor: &Actor,
        details: impl Into<String>,
        proposal_id: Option<String>,
        file_id: Option<Uuid>,
    ) {
        let event = AuditEvent::new(event_type, actor, details, proposal_id, file_id);
        match self.log.append(&event).await {
            Ok(()) => debug!(
                subsystem = "api",
                component = "audit",
                event_type = %event.event_type,
                actor_uid = %actor.uid,
                "Audit event recorded"
            ),
            Err(e) => warn!(
                subsystem = "api",
                component = "audit",
                event_type = %event.event_type,
                actor_uid = %actor.uid,
                file_id = ?event.file_id,
                error = %e,
                "Audit append failed, continuing"
            ),
        }
    }
}
