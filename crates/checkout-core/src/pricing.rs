//! # Promotional Price Allocation
//!
//! Converts a cart plus a promotional bundle total into per-line charged
//! prices whose sum equals the promotional total exactly. The commerce
//! platform independently sums line totals, so any drift between the
//! allocated lines and the promotional total would misstate the order.

use crate::cart::{CartLine, ShippingMethod};
use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};

/// Output of the external promotion-eligibility rule.
///
/// The engine never decides eligibility; it only allocates the quoted total
/// across the cart lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionQuote {
    /// Discounted total for the whole cart (excluding shipping)
    pub promotional_total: f64,

    /// Amount saved versus the original subtotal
    #[serde(default)]
    pub savings: f64,

    /// Whether the bundle promotion applied
    #[serde(default)]
    pub bundle_active: bool,

    /// Shipping cost charged on top of the promotional total
    #[serde(default)]
    pub shipping_cost: f64,

    /// Chosen shipping method
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

impl PromotionQuote {
    /// Total the customer pays, shipping included
    pub fn grand_total(&self) -> f64 {
        self.promotional_total + self.shipping_cost
    }
}

/// Charged price for one cart line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocatedPrice {
    /// Discounted unit price charged for this line
    pub unit_price: f64,
    /// `unit_price × quantity`
    pub line_total: f64,
}

/// Per-line charged prices for one checkout attempt.
///
/// Recomputed fresh per attempt; never persisted across attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAllocation {
    lines: Vec<AllocatedPrice>,
    promotional_total: f64,
}

impl PriceAllocation {
    /// Allocate `promotional_total` across the cart lines.
    ///
    /// Every line but the last is charged `unit_price × ratio` where
    /// `ratio = promotional_total / original_subtotal`; the last line absorbs
    /// the rounding remainder so the allocated totals sum to the promotional
    /// total within floating-point epsilon.
    pub fn compute(lines: &[CartLine], promotional_total: f64) -> CheckoutResult<Self> {
        if lines.is_empty() {
            return Err(CheckoutError::InvalidCartState("cart is empty".to_string()));
        }
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(CheckoutError::InvalidCartState(format!(
                "zero quantity for {}",
                line.name
            )));
        }

        let original_subtotal: f64 = lines.iter().map(CartLine::line_total).sum();
        if original_subtotal <= 0.0 {
            return Err(CheckoutError::InvalidCartState(
                "original subtotal is zero".to_string(),
            ));
        }
        if promotional_total <= 0.0 {
            return Err(CheckoutError::InvalidCartState(format!(
                "promotional total must be positive, got {}",
                promotional_total
            )));
        }

        let ratio = promotional_total / original_subtotal;
        let mut allocated = Vec::with_capacity(lines.len());
        let mut running = 0.0_f64;

        for (index, line) in lines.iter().enumerate() {
            let is_last = index + 1 == lines.len();
            let unit_price = if is_last && lines.len() > 1 {
                // Last line absorbs the remainder so the sum is exact
                (promotional_total - running) / line.quantity as f64
            } else {
                line.unit_price * ratio
            };
            debug_assert!(unit_price >= 0.0);

            let line_total = unit_price * line.quantity as f64;
            running += line_total;
            allocated.push(AllocatedPrice {
                unit_price,
                line_total,
            });
        }

        Ok(Self {
            lines: allocated,
            promotional_total,
        })
    }

    /// Charged price for the line at `index`
    pub fn get(&self, index: usize) -> Option<&AllocatedPrice> {
        self.lines.get(index)
    }

    /// Iterate charged prices in line order
    pub fn iter(&self) -> impl Iterator<Item = &AllocatedPrice> {
        self.lines.iter()
    }

    /// Sum of allocated line totals
    pub fn allocated_total(&self) -> f64 {
        self.lines.iter().map(|p| p.line_total).sum()
    }

    /// The promotional total this allocation was computed for
    pub fn promotional_total(&self) -> f64 {
        self.promotional_total
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(unit_price: f64, quantity: u32) -> CartLine {
        CartLine {
            product_id: format!("prod-{}", unit_price),
            name: "Jersey".into(),
            size: "M".into(),
            color: None,
            quantity,
            unit_price,
            image: None,
            variants: Vec::new(),
            personalization: None,
            in_bundle: true,
        }
    }

    const CENT: f64 = 0.005;

    #[test]
    fn test_three_line_bundle_sums_exact() {
        let lines = vec![line(10000.0, 1), line(15000.0, 1), line(20000.0, 1)];
        let allocation = PriceAllocation::compute(&lines, 39900.0).unwrap();

        assert!((allocation.allocated_total() - 39900.0).abs() < CENT);
        for price in allocation.iter() {
            assert!(price.unit_price >= 0.0);
        }
    }

    #[test]
    fn test_last_line_absorbs_remainder_with_quantities() {
        let lines = vec![line(3333.0, 2), line(7777.0, 1), line(123.45, 3)];
        let subtotal: f64 = lines.iter().map(CartLine::line_total).sum();
        let promotional_total = subtotal * 0.73;

        let allocation = PriceAllocation::compute(&lines, promotional_total).unwrap();
        assert!((allocation.allocated_total() - promotional_total).abs() < CENT);
    }

    #[test]
    fn test_single_line_cart() {
        let lines = vec![line(12000.0, 2)];
        let allocation = PriceAllocation::compute(&lines, 18000.0).unwrap();

        assert!((allocation.get(0).unwrap().unit_price - 9000.0).abs() < CENT);
        assert!((allocation.allocated_total() - 18000.0).abs() < CENT);
    }

    #[test]
    fn test_sum_exact_across_many_carts() {
        for n in 1..8u32 {
            let lines: Vec<CartLine> = (0..n)
                .map(|i| line(999.0 + f64::from(i) * 431.77, (i % 3) + 1))
                .collect();
            let subtotal: f64 = lines.iter().map(CartLine::line_total).sum();
            let promotional_total = subtotal * 0.85;

            let allocation = PriceAllocation::compute(&lines, promotional_total).unwrap();
            assert!(
                (allocation.allocated_total() - promotional_total).abs() < CENT,
                "drift for {} lines",
                n
            );
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = PriceAllocation::compute(&[], 1000.0).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidCartState(_)));
    }

    #[test]
    fn test_zero_subtotal_rejected() {
        let lines = vec![line(0.0, 2)];
        let err = PriceAllocation::compute(&lines, 1000.0).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidCartState(_)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = vec![line(1000.0, 1), line(2000.0, 0)];
        let err = PriceAllocation::compute(&lines, 1500.0).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidCartState(_)));
    }

    #[test]
    fn test_zero_promotional_total_rejected() {
        let lines = vec![line(1000.0, 1)];
        let err = PriceAllocation::compute(&lines, 0.0).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidCartState(_)));
    }

    #[test]
    fn test_grand_total_includes_shipping() {
        let quote = PromotionQuote {
            promotional_total: 39900.0,
            savings: 5100.0,
            bundle_active: true,
            shipping_cost: 2500.0,
            shipping_method: ShippingMethod::Express,
        };
        assert_eq!(quote.grand_total(), 42400.0);
    }
}
