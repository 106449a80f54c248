//! Order status derivation.
//!
//! Status is decided by an ordered list of rules; the first rule that
//! matches wins. The final rule always matches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Situation id of an order that is still open.
pub const PENDING_SITUATION_ID: i32 = 1;

/// Closure-reason id meaning "service completed".
pub const COMPLETED_CLOSURE_REASON_ID: i32 = 2;

/// Derived status of a service order.
///
/// Ordering follows the declaration order, so grouped tables list
/// Pending, Completed, Cancelled and then raw situation labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    /// Raw situation description, used when no other rule applies.
    Situation(String),
}

impl OrderStatus {
    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Pending => "Pendente",
            OrderStatus::Completed => "Conclusão do Serviço",
            OrderStatus::Cancelled => "Cancelada",
            OrderStatus::Situation(text) => text,
        }
    }

    /// Inverse of [`label`](Self::label). Unknown labels become `Situation`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Pendente" => OrderStatus::Pending,
            "Conclusão do Serviço" => OrderStatus::Completed,
            "Cancelada" => OrderStatus::Cancelled,
            other => OrderStatus::Situation(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw columns the status is derived from.
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub situation_code: i32,
    pub closure_reason_id: Option<i32>,
    pub situation_description: &'a str,
}

/// A named status rule. Returns `Some` when it applies.
pub struct StatusRule {
    pub name: &'static str,
    pub apply: fn(&StatusInputs<'_>) -> Option<OrderStatus>,
}

/// Status rules in priority order.
pub const STATUS_RULES: &[StatusRule] = &[
    StatusRule { name: "pending", apply: pending_rule },
    StatusRule { name: "completed", apply: completed_rule },
    StatusRule { name: "cancelled", apply: cancelled_rule },
    StatusRule { name: "situation", apply: situation_rule },
];

fn pending_rule(i: &StatusInputs<'_>) -> Option<OrderStatus> {
    (i.situation_code == PENDING_SITUATION_ID).then_some(OrderStatus::Pending)
}

fn completed_rule(i: &StatusInputs<'_>) -> Option<OrderStatus> {
    (i.closure_reason_id == Some(COMPLETED_CLOSURE_REASON_ID)).then_some(OrderStatus::Completed)
}

fn cancelled_rule(i: &StatusInputs<'_>) -> Option<OrderStatus> {
    match i.closure_reason_id {
        Some(id) if id != COMPLETED_CLOSURE_REASON_ID => Some(OrderStatus::Cancelled),
        _ => None,
    }
}

fn situation_rule(i: &StatusInputs<'_>) -> Option<OrderStatus> {
    Some(OrderStatus::Situation(i.situation_description.to_string()))
}

/// Evaluate the rules and return the winning status with the rule name.
pub fn derive_status_with_rule(inputs: &StatusInputs<'_>) -> (OrderStatus, &'static str) {
    STATUS_RULES
        .iter()
        .find_map(|rule| (rule.apply)(inputs).map(|status| (status, rule.name)))
        .unwrap_or_else(|| {
            (
                OrderStatus::Situation(inputs.situation_description.to_string()),
                "situation",
            )
        })
}

pub fn derive_status(inputs: &StatusInputs<'_>) -> OrderStatus {
    derive_status_with_rule(inputs).0
}
