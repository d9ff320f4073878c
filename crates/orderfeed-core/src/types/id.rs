//! Newtype wrappers for every identifier the client handles.
//!
//! Client-minted identifiers wrap [`uuid::Uuid`]; backend catalog
//! identifiers (products, restaurants) wrap the backend's numeric keys.
//! Distinct types prevent passing a `ProductId` where a `RestaurantId`
//! is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a newtype ID wrapper around `Uuid`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner UUID value.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }

            /// Short prefix used when listing identifiers to humans.
            pub fn short(&self) -> String {
                self.0.simple().to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

/// Macro to define a newtype ID wrapper around a backend numeric key.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the raw backend key.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an active foreground view client.
    ClientId
);

define_id!(
    /// Unique identifier for a rendered notification.
    NotificationId
);

define_numeric_id!(
    /// Backend identifier of an order.
    OrderId
);

define_numeric_id!(
    /// Backend identifier of a menu product (the cart's item key).
    ProductId
);

define_numeric_id!(
    /// Backend identifier of a restaurant (the live feed's recipient identity).
    RestaurantId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_from_str() {
        let uuid = Uuid::new_v4();
        let id: ClientId = uuid.to_string().parse().expect("should parse");
        assert_eq!(id.0, uuid);
    }

    #[test]
    fn test_client_id_short() {
        let id: ClientId = "7c9e6679-7425-40de-944b-e07fc1f90ae7".parse().expect("parse");
        assert_eq!(id.short(), "7c9e6679");
    }

    #[test]
    fn test_numeric_id_serde_is_transparent() {
        let id = ProductId(42);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "42");
        let parsed: RestaurantId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(parsed, RestaurantId(7));
    }

    #[test]
    fn test_numeric_id_from_str_trims() {
        let id: ProductId = " 42 ".parse().expect("parse");
        assert_eq!(id.get(), 42);
    }
}
