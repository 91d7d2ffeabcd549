//! Kitchen-relevant view of one order.
//!
//! # Immutability
//! An [`OrderSnapshot`] is never edited in place. A status change produces a new snapshot
//! (see [`OrderSnapshot::with_status`]), and the poller replaces the whole
//! [`CacheEntrySet`] on every successful refresh.
//!
//! # Upstream records
//! The order service speaks [`RawOrderRecord`]. Converting with `TryFrom` is the single
//! validation point: unknown statuses and non-positive quantities are rejected there.

use crate::error::OrderError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe identifier for Tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub u64);

impl From<u64> for TableId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of order statuses the kitchen knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Preparing,
    Ready,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Created,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Case-insensitive, so `ready` and `READY` both parse. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub table_id: TableId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl OrderSnapshot {
    pub fn new(
        id: OrderId,
        table_id: TableId,
        status: OrderStatus,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            table_id,
            status,
            items,
            created_at,
        }
    }

    /// Returns a copy of this snapshot carrying `status`.
    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Active orders keyed by id, replaced wholesale on every successful poll.
pub type CacheEntrySet = BTreeMap<OrderId, OrderSnapshot>;

/// Builds a [`CacheEntrySet`]. A later snapshot with the same id wins.
pub fn entry_set(snapshots: impl IntoIterator<Item = OrderSnapshot>) -> CacheEntrySet {
    snapshots.into_iter().map(|s| (s.id, s)).collect()
}

// =============================================================================
// Upstream wire format
// =============================================================================

/// An order as returned by the upstream order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderRecord {
    pub id: u64,
    pub table_id: u64,
    pub status: String,
    #[serde(default)]
    pub items: Vec<RawOrderItem>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(alias = "name")]
    pub item_name: String,
    pub quantity: i64,
}

impl TryFrom<RawOrderRecord> for OrderSnapshot {
    type Error = OrderError;

    fn try_from(raw: RawOrderRecord) -> Result<Self, Self::Error> {
        let status = raw.status.parse::<OrderStatus>()?;
        let items = raw
            .items
            .into_iter()
            .map(|item| {
                u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .map(|q| OrderItem::new(item.item_name.clone(), q))
                    .ok_or_else(|| OrderError::InvalidItem {
                        order_id: raw.id,
                        reason: format!("quantity {} for '{}' must be positive", item.quantity, item.item_name),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let created_at = match raw.created_at.as_deref() {
            Some(value) => parse_timestamp(value)?,
            None => Utc::now(),
        };

        Ok(OrderSnapshot::new(
            OrderId(raw.id),
            TableId(raw.table_id),
            status,
            items,
            created_at,
        ))
    }
}

/// Accepts RFC 3339 timestamps and offset-less local timestamps (read as UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, OrderError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| OrderError::MalformedResponse(format!("bad timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: &str, quantity: i64) -> RawOrderRecord {
        RawOrderRecord {
            id: 1,
            table_id: 101,
            status: status.to_string(),
            items: vec![RawOrderItem {
                id: Some(1),
                item_name: "BBQ Chicken Wings".to_string(),
                quantity,
            }],
            created_at: Some("2025-03-01T12:30:00.123".to_string()),
        }
    }

    #[test]
    fn test_status_parsing_is_closed() {
        assert_eq!("ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
        assert_eq!("PREPARING".parse::<OrderStatus>().unwrap(), OrderStatus::Preparing);
        assert_eq!(
            "SERVED".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus("SERVED".to_string()))
        );
    }

    #[test]
    fn test_raw_record_converts() {
        let snapshot = OrderSnapshot::try_from(raw("CREATED", 2)).unwrap();
        assert_eq!(snapshot.id, OrderId(1));
        assert_eq!(snapshot.table_id, TableId(101));
        assert_eq!(snapshot.status, OrderStatus::Created);
        assert_eq!(snapshot.items, vec![OrderItem::new("BBQ Chicken Wings", 2)]);
        assert_eq!(snapshot.created_at.to_rfc3339(), "2025-03-01T12:30:00.123+00:00");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = OrderSnapshot::try_from(raw("COOKING", 1));
        assert!(matches!(result, Err(OrderError::UnknownStatus(s)) if s == "COOKING"));
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        assert!(matches!(
            OrderSnapshot::try_from(raw("CREATED", 0)),
            Err(OrderError::InvalidItem { order_id: 1, .. })
        ));
    }

    #[test]
    fn test_with_status_leaves_original_untouched() {
        let original = OrderSnapshot::try_from(raw("PREPARING", 1)).unwrap();
        let ready = original.with_status(OrderStatus::Ready);
        assert_eq!(original.status, OrderStatus::Preparing);
        assert_eq!(ready.status, OrderStatus::Ready);
        assert_eq!(ready.items, original.items);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = OrderSnapshot::try_from(raw("READY", 3)).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["tableId"], 101);
        assert_eq!(json["status"], "READY");
        assert_eq!(json["items"][0]["quantity"], 3);
    }
}
