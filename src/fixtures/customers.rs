//! Customer Fixtures

use serde::Deserialize;

use crate::customers::CustomerContext;

/// Customer Fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerFixture {
    /// Customer identifier
    pub id: String,

    /// Groups the customer belongs to
    #[serde(default)]
    pub groups: Vec<String>,

    /// Loyalty level
    #[serde(default)]
    pub loyalty_level: Option<u32>,

    /// Payment method for the order
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl From<CustomerFixture> for CustomerContext {
    fn from(fixture: CustomerFixture) -> Self {
        let mut customer = fixture
            .groups
            .into_iter()
            .fold(CustomerContext::new(fixture.id), CustomerContext::with_group);

        if let Some(level) = fixture.loyalty_level {
            customer = customer.with_loyalty_level(level);
        }

        if let Some(method) = fixture.payment_method {
            customer = customer.with_payment_method(method);
        }

        customer
    }
}
