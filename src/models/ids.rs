//! Typed identifiers for ledger records
//!
//! Each record kind gets its own UUID newtype so an item id can never be
//! passed where an employee id is expected. Ids are ordered because they key
//! the `BTreeMap`s of the ledger document, which keeps the JSON and its
//! checksum stable. Operators see a short form (`itm-1a2b3c4d`) and may
//! type either that or the full UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Hex digits of the UUID shown in the short form
const SHORT_LEN: usize = 8;

/// An id string that is neither a UUID nor a prefixed UUID of the right kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id '{input}'")]
pub struct IdParseError {
    pub kind: &'static str,
    pub input: String,
}

macro_rules! define_id {
    ($name:ident, $prefix:literal, $kind:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// True when `query` names this id in full or short form
            pub fn matches(&self, query: &str) -> bool {
                let query = query.trim().to_ascii_lowercase();
                query == self.to_string()
                    || query.parse::<$name>().map_or(false, |id| id == *self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let hex = self.0.simple().to_string();
                write!(f, "{}{}", $prefix, &hex[..SHORT_LEN])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let bare = trimmed.strip_prefix($prefix).unwrap_or(trimmed);
                Uuid::parse_str(bare).map(Self).map_err(|_| IdParseError {
                    kind: $kind,
                    input: s.to_string(),
                })
            }
        }
    };
}

define_id!(ItemId, "itm-", "item");
define_id!(EmployeeId, "emp-", "employee");
define_id!(DeliveryId, "dlv-", "delivery");
define_id!(AlertId, "alr-", "alert");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const RAW: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_short_form_uses_kind_prefix() {
        let uuid = Uuid::parse_str(RAW).unwrap();
        assert_eq!(ItemId::from(uuid).to_string(), "itm-550e8400");
        assert_eq!(EmployeeId::from(uuid).to_string(), "emp-550e8400");
        assert_eq!(DeliveryId::from(uuid).to_string(), "dlv-550e8400");
        assert_eq!(AlertId::from(uuid).to_string(), "alr-550e8400");
    }

    #[test]
    fn test_operator_input_forms() {
        let id = ItemId::from(Uuid::parse_str(RAW).unwrap());

        assert!(id.matches(RAW));
        assert!(id.matches(&format!("itm-{}", RAW)));
        assert!(id.matches("  ITM-550E8400 "));
        assert!(!id.matches("itm-550e8401"));
        assert!(!id.matches("emp-550e8400"));
    }

    #[test]
    fn test_prefix_of_another_kind_is_rejected() {
        let err = format!("emp-{}", RAW).parse::<ItemId>().unwrap_err();
        assert_eq!(err.kind, "item");
        assert_eq!(err.to_string(), format!("invalid item id 'emp-{}'", RAW));

        assert!(format!("emp-{}", RAW).parse::<EmployeeId>().is_ok());
    }

    #[test]
    fn test_ids_serialize_as_plain_uuid_strings() {
        let id = DeliveryId::from(Uuid::parse_str(RAW).unwrap());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", RAW));

        let back: DeliveryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_map_keys_serialize_in_uuid_order() {
        let low = AlertId::from(Uuid::from_u128(1));
        let high = AlertId::from(Uuid::from_u128(2));

        let mut first = BTreeMap::new();
        first.insert(high, "b");
        first.insert(low, "a");
        let mut second = BTreeMap::new();
        second.insert(low, "a");
        second.insert(high, "b");

        let json = serde_json::to_string(&first).unwrap();
        assert_eq!(json, serde_json::to_string(&second).unwrap());
        assert!(json.find(&low.as_uuid().to_string()) < json.find(&high.as_uuid().to_string()));
    }
}
