use std::collections::BTreeMap;
use std::sync::Mutex;

use cdt_schemas::Fill;

pub trait FillRepository: Send + Sync {
    fn insert(&self, fill: Fill);

    fn list_for_order(&self, order_external_id: &str) -> Vec<Fill>;
}

#[derive(Default)]
pub struct InMemoryFillRepository {
    by_order: Mutex<BTreeMap<String, Vec<Fill>>>,
}

impl InMemoryFillRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FillRepository for InMemoryFillRepository {
    fn insert(&self, fill: Fill) {
        self.by_order
            .lock()
            .unwrap()
            .entry(fill.order_external_id.clone())
            .or_default()
            .push(fill);
    }

    fn list_for_order(&self, order_external_id: &str) -> Vec<Fill> {
        self.by_order
            .lock()
            .unwrap()
            .get(order_external_id)
            .cloned()
            .unwrap_or_default()
    }
}
