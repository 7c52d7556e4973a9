//! # Line Mapping
//!
//! Converts cart lines into the external line-item identifiers and custom
//! attributes the commerce platform and payment gateway require. Variant
//! resolution is strict: a line whose chosen size has no matching variant
//! aborts the whole attempt rather than substituting.

use crate::cart::CartLine;
use crate::error::{CheckoutError, CheckoutResult};
use crate::pricing::{PriceAllocation, PromotionQuote};
use serde::{Deserialize, Serialize};

/// A custom attribute attached to a mapped line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAttribute {
    pub key: String,
    pub value: String,
}

impl LineAttribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A cart line resolved to its external identifiers and charged price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedLineItem {
    /// Variant id in `gid://` form (kept for reference)
    pub variant_gid: String,

    /// Numeric variant id for the commerce platform's Admin API
    pub variant_id: u64,

    pub name: String,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: u32,

    /// Discounted unit price actually charged
    pub charged_unit_price: f64,

    /// Original unit price, kept for reference
    pub original_unit_price: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Custom attributes (personalization, bundle summary)
    #[serde(default)]
    pub attributes: Vec<LineAttribute>,
}

impl MappedLineItem {
    /// Composed line title for order display
    pub fn title(&self) -> String {
        let mut title = self.name.clone();
        title.push_str(&format!(" - Size {}", self.size));
        if let Some(color) = &self.color {
            title.push_str(&format!(" - {}", color));
        }
        title
    }

    /// Charged line total
    pub fn line_total(&self) -> f64 {
        self.charged_unit_price * self.quantity as f64
    }
}

/// Map every cart line to its external variant and charged price.
///
/// Bundle summary attributes (activation, savings, shipping note) go on the
/// first line only, so the bundle metadata is not duplicated across the order.
pub fn map_cart_lines(
    lines: &[CartLine],
    allocation: &PriceAllocation,
    quote: &PromotionQuote,
) -> CheckoutResult<Vec<MappedLineItem>> {
    if lines.len() != allocation.len() {
        return Err(CheckoutError::Internal(format!(
            "allocation covers {} lines but cart has {}",
            allocation.len(),
            lines.len()
        )));
    }

    let mut mapped = Vec::with_capacity(lines.len());
    let mut first_line = true;

    for (index, line) in lines.iter().enumerate() {
        let variant = resolve_variant(line)?;
        let variant_id = numeric_variant_id(&variant.id)?;
        let charged = allocation
            .get(index)
            .ok_or_else(|| CheckoutError::Internal("allocation index out of range".to_string()))?;

        let mut attributes = Vec::new();

        if let Some(personalization) = &line.personalization {
            attributes.push(LineAttribute::new("Custom name", personalization.name()));
            attributes.push(LineAttribute::new(
                "Custom number",
                personalization.number().to_string(),
            ));
        }

        if quote.bundle_active && first_line {
            attributes.push(LineAttribute::new("Bundle", "Active"));
            attributes.push(LineAttribute::new(
                "Bundle savings",
                format!("{:.2}", quote.savings),
            ));
            attributes.push(LineAttribute::new("Shipping", "Free (included)"));
            first_line = false;
        }

        mapped.push(MappedLineItem {
            variant_gid: variant.id.clone(),
            variant_id,
            name: line.name.clone(),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            charged_unit_price: charged.unit_price,
            original_unit_price: line.unit_price,
            image: line.image.clone(),
            attributes,
        });
    }

    Ok(mapped)
}

/// Find the variant matching the line's chosen size.
///
/// A selected option named "size" (case-insensitive) wins; the variant title
/// is the fallback for platforms that encode the size there.
fn resolve_variant(line: &CartLine) -> CheckoutResult<&crate::cart::VariantOption> {
    line.variants
        .iter()
        .find(|variant| {
            let by_option = variant.selected_options.iter().any(|option| {
                option.name.eq_ignore_ascii_case("size") && option.value == line.size
            });
            let by_title = variant
                .title
                .as_deref()
                .map(|title| title == line.size || title.contains(line.size.as_str()))
                .unwrap_or(false);
            by_option || by_title
        })
        .ok_or_else(|| CheckoutError::VariantNotFound {
            product: line.name.clone(),
            size: line.size.clone(),
        })
}

/// Extract the numeric id from a `gid://.../ProductVariant/{n}` identifier.
/// Bare numeric ids pass through unchanged.
fn numeric_variant_id(gid: &str) -> CheckoutResult<u64> {
    gid.rsplit('/')
        .next()
        .and_then(|tail| tail.parse().ok())
        .ok_or_else(|| {
            CheckoutError::InvalidRequest(format!("malformed variant id: {}", gid))
        })
}
