//! Service-type catalog.
//!
//! The code → category table below is the single source for both the
//! query's allow-list and local categorization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a service order, derived from its service-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Diagnostic,
    Probing,
    Suppression,
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Diagnostic,
        ServiceType::Probing,
        ServiceType::Suppression,
        ServiceType::Other,
    ];

    /// Label shown on charts and in the export.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Diagnostic => "Diagnóstico",
            ServiceType::Probing => "Sondagem",
            ServiceType::Suppression => "Supressão",
            ServiceType::Other => "Outro",
        }
    }

    /// Inverse of [`label`](Self::label).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Service-type codes mapped to this category. Empty for `Other`.
    pub fn codes(&self) -> Vec<i32> {
        SERVICE_TYPE_CODES
            .iter()
            .filter(|(_, t)| t == self)
            .map(|(code, _)| *code)
            .collect()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Known service-type codes and their category.
pub const SERVICE_TYPE_CODES: &[(i32, ServiceType)] = &[
    (718, ServiceType::Diagnostic),
    (719, ServiceType::Probing),
    (720, ServiceType::Probing),
    (803, ServiceType::Probing),
    (33, ServiceType::Suppression),
    (82, ServiceType::Suppression),
    (32, ServiceType::Suppression),
    (804, ServiceType::Suppression),
    (811, ServiceType::Suppression),
    (810, ServiceType::Suppression),
    (36, ServiceType::Suppression),
    (726, ServiceType::Suppression),
    (807, ServiceType::Suppression),
];

/// Map a service-type code to its category. Total: unknown codes are `Other`.
pub fn categorize(code: i32) -> ServiceType {
    SERVICE_TYPE_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, t)| *t)
        .unwrap_or(ServiceType::Other)
}

/// Codes the source query is restricted to.
pub fn allowed_codes() -> Vec<i32> {
    SERVICE_TYPE_CODES.iter().map(|(code, _)| *code).collect()
}

pub fn is_allowed(code: i32) -> bool {
    SERVICE_TYPE_CODES.iter().any(|(c, _)| *c == code)
}
