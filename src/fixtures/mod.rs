//! Fixtures
//!
//! YAML fixture sets under `<base>/{orders,promotions,customers}/<name>.yml`.

use std::{fs, path::PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    customers::CustomerContext,
    fixtures::{customers::CustomerFixture, orders::OrderFixture, promotions::PromotionsFixture},
    orders::{Order, OrderError, OrderLine},
    promotions::Promotion,
};

pub mod customers;
pub mod orders;
pub mod prices;
pub mod promotions;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Invalid promotion data
    #[error("Invalid promotion data: {0}")]
    InvalidPromotionData(String),

    /// Order fixture without lines
    #[error("Order fixture has no lines")]
    NoLines,

    /// No order loaded yet
    #[error("No order loaded")]
    NoOrder,

    /// Order validation error
    #[error("Invalid order: {0}")]
    Order(#[from] OrderError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    order: Option<Order<'static>>,

    /// Promotions sorted by code
    promotions: Vec<Promotion<'static>>,

    customer: Option<CustomerContext>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            order: None,
            promotions: Vec::new(),
            customer: None,
        }
    }

    fn read<T: DeserializeOwned>(&self, category: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load an order from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the order is invalid.
    pub fn load_order(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OrderFixture = self.read("orders", name)?;

        self.order = Some(Order::try_from(fixture)?);

        Ok(self)
    }

    /// Load promotions from a YAML fixture file, adding to any already loaded
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a promotion is invalid.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PromotionsFixture = self.read("promotions", name)?;

        for (code, promotion_fixture) in fixture.promotions {
            self.promotions
                .push(promotion_fixture.try_into_promotion(code)?);
        }

        self.promotions.sort_by(|a, b| a.code().cmp(b.code()));

        Ok(self)
    }

    /// Load a customer from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_customer(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CustomerFixture = self.read("customers", name)?;

        self.customer = Some(CustomerContext::from(fixture));

        Ok(self)
    }

    /// Whether a customer fixture named `name` exists.
    pub fn has_customer(&self, name: &str) -> bool {
        self.base_path
            .join("customers")
            .join(format!("{name}.yml"))
            .is_file()
    }

    /// Load a complete fixture set (order and promotions with the same name, plus the customer
    /// when one exists) from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::new().load_set(name)
    }

    /// Load a complete fixture set into this fixture
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn load_set(mut self, name: &str) -> Result<Self, FixtureError> {
        self.load_order(name)?.load_promotions(name)?;

        if self.has_customer(name) {
            self.load_customer(name)?;
        }

        Ok(self)
    }

    /// Get the loaded order
    ///
    /// # Errors
    ///
    /// Returns an error if no order has been loaded.
    pub fn order(&self) -> Result<&Order<'static>, FixtureError> {
        self.order.as_ref().ok_or(FixtureError::NoOrder)
    }

    /// Get the first order line for a product
    ///
    /// # Errors
    ///
    /// Returns an error if no order is loaded or the product is not on it.
    pub fn line(&self, product: &str) -> Result<&OrderLine<'static>, FixtureError> {
        self.order()?
            .iter()
            .find(|line| line.product().as_str() == product)
            .ok_or_else(|| FixtureError::ProductNotFound(product.to_string()))
    }

    /// Get all promotions, sorted by code
    pub fn promotions(&self) -> &[Promotion<'static>] {
        &self.promotions
    }

    /// Get a promotion by its code
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion(&self, code: &str) -> Result<&Promotion<'static>, FixtureError> {
        self.promotions
            .iter()
            .find(|promotion| promotion.code().as_str() == code)
            .ok_or_else(|| FixtureError::PromotionNotFound(code.to_string()))
    }

    /// Get the loaded customer, if any
    pub fn customer(&self) -> Option<&CustomerContext> {
        self.customer.as_ref()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
