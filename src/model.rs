use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::catalog::ServiceType;
use crate::month::MonthKey;
use crate::status::OrderStatus;

/// One service order, as projected by the source query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOrderRecord {
    pub order_id: i64,
    pub property_id: i64,
    pub locality_id: i64,
    pub generated_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub service_type: ServiceType,
    pub status: OrderStatus,
    pub service_description: String,
    pub closure_reason: Option<String>,
}

impl ServiceOrderRecord {
    pub fn generated_on(&self) -> NaiveDate {
        self.generated_at.date()
    }

    pub fn generation_month(&self) -> MonthKey {
        MonthKey::of(&self.generated_at)
    }

    /// A pending order has no closure time. Drops one that slipped through
    /// and returns whether it did.
    pub fn clear_pending_closure(&mut self) -> bool {
        if self.status.is_pending() && self.closed_at.is_some() {
            log::warn!(
                "Order {} is pending but has a closure time; ignoring the closure time",
                self.order_id
            );
            self.closed_at = None;
            return true;
        }
        false
    }
}
