//! # Cart Types
//!
//! Cart lines as handed over by the storefront at checkout start.
//! The line set is frozen once submitted; pricing and mapping never mutate it.

use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};

/// Supported settlement currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    ARS,
    BRL,
    CLP,
    COP,
    MXN,
    USD,
}

impl Currency {
    /// Returns the ISO 4217 currency code as the gateway expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::ARS => "ARS",
            Currency::BRL => "BRL",
            Currency::CLP => "CLP",
            Currency::COP => "COP",
            Currency::MXN => "MXN",
            Currency::USD => "USD",
        }
    }

    /// Default gateway country for this settlement currency
    pub fn default_country(&self) -> &'static str {
        match self {
            Currency::ARS => "AR",
            Currency::BRL => "BR",
            Currency::CLP => "CL",
            Currency::COP => "CO",
            Currency::MXN => "MX",
            Currency::USD => "US",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::ARS
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One name/value pair of a variant's selected options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// A purchasable variant of a product, as the commerce platform reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOption {
    /// Platform variant id in `gid://.../ProductVariant/{n}` form
    pub id: String,

    /// Variant title (often just the size)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Selected options (e.g. Size=M, Color=Navy)
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

/// Maximum length of a personalization name
pub const MAX_PERSONALIZATION_NAME: usize = 15;

/// Maximum personalization number
pub const MAX_PERSONALIZATION_NUMBER: u8 = 99;

/// Optional print personalization for a line (name and shirt number)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personalization {
    name: String,
    number: u8,
}

impl Personalization {
    /// Create a validated personalization.
    ///
    /// The name is trimmed and must be 1..=15 characters; the number must be
    /// 0..=99. Violations are `InvalidCartState`.
    pub fn new(name: impl Into<String>, number: u8) -> CheckoutResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CheckoutError::InvalidCartState(
                "personalization name is empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_PERSONALIZATION_NAME {
            return Err(CheckoutError::InvalidCartState(format!(
                "personalization name exceeds {} characters: {}",
                MAX_PERSONALIZATION_NAME, name
            )));
        }
        if number > MAX_PERSONALIZATION_NUMBER {
            return Err(CheckoutError::InvalidCartState(format!(
                "personalization number out of range: {}",
                number
            )));
        }
        Ok(Self { name, number })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u8 {
        self.number
    }
}

/// A line in the submitted cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product id on the commerce platform
    pub product_id: String,

    /// Product display name
    pub name: String,

    /// Chosen size (resolved against `variants` at mapping time)
    pub size: String,

    /// Chosen color, if the product has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Quantity, at least 1
    pub quantity: u32,

    /// Original unit price, pre-discount, in decimal currency units
    pub unit_price: f64,

    /// Product image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Variants available for this product
    #[serde(default)]
    pub variants: Vec<VariantOption>,

    /// Optional print personalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalization: Option<Personalization>,

    /// Whether this line participates in the promotional bundle
    #[serde(default)]
    pub in_bundle: bool,
}

impl CartLine {
    /// Original line total (pre-discount)
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Shipping method chosen at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Standard,
    Express,
}

impl ShippingMethod {
    /// Shipping-line code for the commerce platform
    pub fn code(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "STANDARD",
            ShippingMethod::Express => "EXPRESS",
        }
    }

    /// Customer-facing carrier name
    pub fn display_name(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "Standard Post",
            ShippingMethod::Express => "Private Express Courier",
        }
    }
}

impl Default for ShippingMethod {
    fn default() -> Self {
        ShippingMethod::Standard
    }
}

/// Shipping and contact details collected by the surrounding application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// National identity/tax document required by the payment gateway
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub province: String,
    pub zip: String,
    pub country: String,
}

impl ShippingInfo {
    /// Payer display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Single-line street address
    pub fn full_address(&self) -> String {
        match &self.address2 {
            Some(extra) if !extra.is_empty() => format!("{}, {}", self.address1, extra),
            _ => self.address1.clone(),
        }
    }
}
