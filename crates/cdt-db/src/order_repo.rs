use std::collections::BTreeMap;
use std::sync::Mutex;

use cdt_schemas::{Order, OrderStatus};

use crate::error::DbError;

/// Unique key: `externalId` (spec §6).
pub trait OrderRepository: Send + Sync {
    fn insert(&self, order: Order) -> Result<(), DbError>;

    fn find_by_external_id(&self, external_id: &str) -> Option<Order>;

    fn update_status(&self, external_id: &str, status: OrderStatus) -> Result<(), DbError>;
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    by_external_id: Mutex<BTreeMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: Order) -> Result<(), DbError> {
        let mut map = self.by_external_id.lock().unwrap();
        if map.contains_key(&order.external_id) {
            return Err(DbError::UniqueConstraintViolation {
                entity: "order",
                key: order.external_id,
            });
        }
        map.insert(order.external_id.clone(), order);
        Ok(())
    }

    fn find_by_external_id(&self, external_id: &str) -> Option<Order> {
        self.by_external_id.lock().unwrap().get(external_id).cloned()
    }

    fn update_status(&self, external_id: &str, status: OrderStatus) -> Result<(), DbError> {
        let mut map = self.by_external_id.lock().unwrap();
        match map.get_mut(external_id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(DbError::NotFound {
                entity: "order",
                key: external_id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_schemas::{Engine, OrderType, Side};

    fn order(external_id: &str) -> Order {
        Order {
            external_id: external_id.into(),
            client_order_id: external_id.into(),
            symbol: "BTCUSDT".into(),
            side: Side::Long,
            engine: Engine::Breakout,
            order_type: OrderType::Limit,
            price: 100.0,
            qty: 1.0,
            status: OrderStatus::Open,
            created_at_ms: 0,
        }
    }

    #[test]
    fn duplicate_external_id_is_rejected() {
        let repo = InMemoryOrderRepository::new();
        repo.insert(order("exec-1")).unwrap();
        let err = repo.insert(order("exec-1")).unwrap_err();
        assert_eq!(
            err,
            DbError::UniqueConstraintViolation { entity: "order", key: "exec-1".into() }
        );
    }

    #[test]
    fn update_status_changes_stored_order() {
        let repo = InMemoryOrderRepository::new();
        repo.insert(order("exec-1")).unwrap();
        repo.update_status("exec-1", OrderStatus::Filled).unwrap();
        assert_eq!(repo.find_by_external_id("exec-1").unwrap().status, OrderStatus::Filled);
    }

    #[test]
    fn update_status_on_missing_order_errors() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.update_status("missing", OrderStatus::Filled).is_err());
    }
}
