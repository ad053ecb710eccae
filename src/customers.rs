//! Customers

use rustc_hash::FxHashSet;

use crate::ids::{CustomerId, GroupId, PaymentMethod};

/// Customer attributes supplied by the caller for customer-specific conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerContext {
    id: CustomerId,
    groups: FxHashSet<GroupId>,
    loyalty_level: Option<u32>,
    payment_method: Option<PaymentMethod>,
}

impl CustomerContext {
    /// Create a customer with no groups, loyalty level or payment method.
    pub fn new(id: impl Into<CustomerId>) -> Self {
        Self {
            id: id.into(),
            groups: FxHashSet::default(),
            loyalty_level: None,
            payment_method: None,
        }
    }

    /// Return a copy of this customer that also belongs to `group`.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<GroupId>) -> Self {
        self.groups.insert(group.into());
        self
    }

    /// Return a copy of this customer with the given loyalty level.
    #[must_use]
    pub fn with_loyalty_level(self, level: u32) -> Self {
        Self {
            loyalty_level: Some(level),
            ..self
        }
    }

    /// Return a copy of this customer paying with `method`.
    #[must_use]
    pub fn with_payment_method(self, method: impl Into<PaymentMethod>) -> Self {
        Self {
            payment_method: Some(method.into()),
            ..self
        }
    }

    /// Customer identifier
    pub fn id(&self) -> &CustomerId {
        &self.id
    }

    /// Whether the customer belongs to `group`.
    pub fn in_group(&self, group: &GroupId) -> bool {
        self.groups.contains(group)
    }

    /// Groups the customer belongs to
    pub fn groups(&self) -> &FxHashSet<GroupId> {
        &self.groups
    }

    /// Loyalty level, if the customer has one
    pub fn loyalty_level(&self) -> Option<u32> {
        self.loyalty_level
    }

    /// Payment method chosen for the order, if known
    pub fn payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_method.as_ref()
    }
}
