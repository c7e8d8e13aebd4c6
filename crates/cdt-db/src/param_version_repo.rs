use std::sync::Mutex;

use cdt_schemas::{active_at, ParamVersion};

pub trait ParamVersionRepository: Send + Sync {
    fn all(&self) -> Vec<ParamVersion>;

    /// The active version at instant `t_ms`: the greatest `effectiveFrom <= t`
    /// (spec §3 "ParamVersion").
    fn active_at(&self, t_ms: i64) -> Option<ParamVersion>;
}

#[derive(Default)]
pub struct InMemoryParamVersionRepository {
    versions: Mutex<Vec<ParamVersion>>,
}

impl InMemoryParamVersionRepository {
    pub fn new(versions: Vec<ParamVersion>) -> Self {
        Self {
            versions: Mutex::new(versions),
        }
    }
}

impl ParamVersionRepository for InMemoryParamVersionRepository {
    fn all(&self) -> Vec<ParamVersion> {
        self.versions.lock().unwrap().clone()
    }

    fn active_at(&self, t_ms: i64) -> Option<ParamVersion> {
        let versions = self.versions.lock().unwrap();
        active_at(&versions, t_ms).cloned()
    }
}
