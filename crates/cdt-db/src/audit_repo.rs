use std::sync::Mutex;

use cdt_schemas::AuditEvent;

pub trait AuditRepository: Send + Sync {
    fn append(&self, event: AuditEvent);

    fn list(&self) -> Vec<AuditEvent>;
}

#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditRepository for InMemoryAuditRepository {
    fn append(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn list(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_schemas::AuditLevel;
    use serde_json::json;

    fn event(step: &str) -> AuditEvent {
        AuditEvent {
            id: "a1".into(),
            ts_ms: 0,
            step: step.into(),
            level: AuditLevel::Info,
            message: "m".into(),
            reason: None,
            inputs_hash: "in".into(),
            outputs_hash: "out".into(),
            params_version_id: "v1".into(),
            metadata: json!({}),
        }
    }

    #[test]
    fn append_then_list_preserves_order() {
        let repo = InMemoryAuditRepository::new();
        repo.append(event("a"));
        repo.append(event("b"));
        let listed = repo.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].step, "a");
        assert_eq!(listed[1].step, "b");
    }
}
