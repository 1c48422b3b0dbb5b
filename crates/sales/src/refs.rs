//! Identity snapshots of records owned by other systems.
//!
//! A sale copies the customer, branch and product display fields at the moment
//! it is written. The copies are never refreshed: renaming a product later
//! does not rewrite past sales.

use serde::Serialize;

use salesdesk_core::{BranchId, CustomerId, DomainError, DomainResult, ProductId, ValueObject};

macro_rules! identity_snapshot {
    ($t:ident, $id:ty, $detail:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        pub struct $t {
            id: $id,
            name: String,
            $detail: String,
        }

        impl $t {
            /// Capture a snapshot; the id must not be nil and the name must not be blank.
            pub fn new(
                id: $id,
                name: impl Into<String>,
                $detail: impl Into<String>,
            ) -> DomainResult<Self> {
                if id.is_nil() {
                    return Err(DomainError::invalid_argument(concat!($label, " id is required")));
                }
                let name = name.into();
                if name.trim().is_empty() {
                    return Err(DomainError::invalid_argument(concat!($label, " name is required")));
                }
                Ok(Self {
                    id,
                    name,
                    $detail: $detail.into(),
                })
            }

            pub fn id(&self) -> $id {
                self.id
            }

            pub fn name(&self) -> &str {
                &self.name
            }

            pub fn $detail(&self) -> &str {
                &self.$detail
            }
        }

        impl ValueObject for $t {}
    };
}

identity_snapshot!(CustomerRef, CustomerId, email, "customer");
identity_snapshot!(BranchRef, BranchId, address, "branch");
identity_snapshot!(ProductRef, ProductId, description, "product");
