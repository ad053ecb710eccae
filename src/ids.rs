//! Identifiers
//!
//! String-backed identifiers handed to the engine by its collaborators. Each one is a distinct
//! type so a product id can never be passed where a promotion code is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Product identifier
    ProductId
}

string_id! {
    /// Product family (category) identifier
    FamilyId
}

string_id! {
    /// Customer identifier
    CustomerId
}

string_id! {
    /// Customer group identifier
    GroupId
}

string_id! {
    /// Payment method identifier (e.g. `card`, `cash`, `voucher`)
    PaymentMethod
}

string_id! {
    /// Promotion code, the identity of a promotion
    PromotionCode
}
