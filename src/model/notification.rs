use crate::model::order::{OrderId, OrderItem, OrderSnapshot, TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// "Order ready" message sent from the kitchen to the waiter side.
///
/// Built once per successful READY transition and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub order_id: OrderId,
    pub table_id: TableId,
    pub items: Vec<OrderItem>,
    pub emitted_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(order_id: OrderId, table_id: TableId, items: Vec<OrderItem>) -> Self {
        Self {
            order_id,
            table_id,
            items,
            emitted_at: Utc::now(),
        }
    }

    /// Builds the event from an upstream-confirmed snapshot.
    pub fn from_snapshot(snapshot: &OrderSnapshot) -> Self {
        Self::new(snapshot.id, snapshot.table_id, snapshot.items.clone())
    }
}
