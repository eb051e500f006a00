//! Resolution of a user's option selection to a purchasable variant.
//!
//! Pure functions over in-memory data: the caller owns the selection
//! state, fetches the variants, and decides what to render. Matching a
//! complete selection yields at most one variant; products are
//! constructed with exactly one variant per full option combination, so
//! two matches indicate corrupt catalog data and are reported rather
//! than resolved arbitrarily.

use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// Separator used when rendering a variant's attribute label
const ATTRIBUTE_SEPARATOR: &str = ", ";

/// A variant as seen by the resolver: identity, price, stock, and its
/// option-value pairs in axis order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvableVariant {
    pub id: Uuid,
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    /// `(option name, option value)` pairs, one per axis
    pub attributes: Vec<(String, String)>,
}

impl ResolvableVariant {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Human-readable label, e.g. `"Color: Red, Size: S"`
    pub fn attributes_label(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join(ATTRIBUTE_SEPARATOR)
    }
}

/// One option axis with its values in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionAxis {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VariantResolveError {
    /// More than one variant carries the selected combination; upstream
    /// data is inconsistent and no price can be trusted
    #[error("more than one variant matches the selected options")]
    AmbiguousSelection,
}

/// Collects the distinct option axes across a product's variants.
/// Axis order and per-axis value order follow first appearance, which
/// mirrors the order the catalog inserted them in.
pub fn option_axes(variants: &[ResolvableVariant]) -> Vec<OptionAxis> {
    let mut axes: Vec<OptionAxis> = Vec::new();

    for variant in variants {
        for (name, value) in &variant.attributes {
            match axes.iter_mut().find(|axis| &axis.name == name) {
                Some(axis) => {
                    if !axis.values.contains(value) {
                        axis.values.push(value.clone());
                    }
                }
                None => axes.push(OptionAxis {
                    name: name.clone(),
                    values: vec![value.clone()],
                }),
            }
        }
    }

    axes
}

/// Seeds a selection with the first value of every axis so a variant is
/// eagerly selected and a valid initial price/stock can be shown.
pub fn default_selection(variants: &[ResolvableVariant]) -> HashMap<String, String> {
    option_axes(variants)
        .into_iter()
        .filter_map(|axis| {
            let first = axis.values.into_iter().next()?;
            Some((axis.name, first))
        })
        .collect()
}

/// Maps a selection of option name -> value onto the unique matching
/// variant.
///
/// Returns `Ok(None)` while the selection is missing at least one axis
/// (the caller keeps prompting), or when a complete selection matches
/// no variant (the combination is not offered). A selection matching
/// more than one variant is an integrity violation and is reported as
/// an error.
pub fn resolve<'a>(
    variants: &'a [ResolvableVariant],
    selection: &HashMap<String, String>,
) -> Result<Option<&'a ResolvableVariant>, VariantResolveError> {
    let axes = option_axes(variants);

    // Incomplete selection: not an error, just no determinate match yet
    if axes.iter().any(|axis| !selection.contains_key(&axis.name)) {
        return Ok(None);
    }

    let mut matches = variants.iter().filter(|variant| {
        variant
            .attributes
            .iter()
            .all(|(name, value)| selection.get(name) == Some(value))
    });

    match (matches.next(), matches.next()) {
        (Some(variant), None) => Ok(Some(variant)),
        (Some(_), Some(_)) => Err(VariantResolveError::AmbiguousSelection),
        (None, _) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn variant(sku: &str, price: Decimal, stock: i32, attrs: &[(&str, &str)]) -> ResolvableVariant {
        ResolvableVariant {
            id: Uuid::new_v4(),
            sku: sku.to_string(),
            price,
            stock,
            attributes: attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// The product used by the storefront walkthrough: three variants
    /// over Color x Size with one combination missing
    fn classic_tee() -> Vec<ResolvableVariant> {
        vec![
            variant(
                "TEE-RED-S",
                dec!(19.99),
                5,
                &[("Color", "Red"), ("Size", "S")],
            ),
            variant(
                "TEE-RED-M",
                dec!(19.99),
                0,
                &[("Color", "Red"), ("Size", "M")],
            ),
            variant(
                "TEE-BLUE-S",
                dec!(21.99),
                3,
                &[("Color", "Blue"), ("Size", "S")],
            ),
        ]
    }

    fn selection(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn axes_follow_insertion_order() {
        let axes = option_axes(&classic_tee());
        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].name, "Color");
        assert_eq!(axes[0].values, vec!["Red", "Blue"]);
        assert_eq!(axes[1].name, "Size");
        assert_eq!(axes[1].values, vec!["S", "M"]);
    }

    #[test]
    fn resolves_every_offered_combination() {
        let variants = classic_tee();
        for v in &variants {
            let sel: HashMap<String, String> = v.attributes.iter().cloned().collect();
            let resolved = resolve(&variants, &sel).unwrap().expect("offered combo");
            assert_eq!(resolved.sku, v.sku);
        }
    }

    #[test]
    fn incomplete_selection_is_no_match_not_error() {
        let variants = classic_tee();
        let result = resolve(&variants, &selection(&[("Color", "Red")])).unwrap();
        assert!(result.is_none());

        let result = resolve(&variants, &HashMap::new()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unoffered_combination_is_no_match() {
        let variants = classic_tee();
        let result = resolve(&variants, &selection(&[("Color", "Blue"), ("Size", "M")])).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn default_selection_resolves_whenever_variants_exist() {
        let variants = classic_tee();
        let seeded = default_selection(&variants);
        assert_eq!(seeded.get("Color").map(String::as_str), Some("Red"));
        assert_eq!(seeded.get("Size").map(String::as_str), Some("S"));

        let resolved = resolve(&variants, &seeded).unwrap().expect("default combo");
        assert_eq!(resolved.sku, "TEE-RED-S");
        assert_eq!(resolved.price, dec!(19.99));
        assert!(resolved.in_stock());
    }

    #[test]
    fn resolution_is_deterministic() {
        let variants = classic_tee();
        let sel = selection(&[("Color", "Blue"), ("Size", "S")]);
        let first = resolve(&variants, &sel).unwrap().map(|v| v.id);
        let second = resolve(&variants, &sel).unwrap().map(|v| v.id);
        assert_eq!(first, second);
    }

    #[test]
    fn classic_tee_walkthrough() {
        let variants = classic_tee();

        let red_s = resolve(&variants, &selection(&[("Color", "Red"), ("Size", "S")]))
            .unwrap()
            .expect("Red/S is offered");
        assert_eq!(red_s.price, dec!(19.99));
        assert!(red_s.in_stock());
        assert_eq!(red_s.attributes_label(), "Color: Red, Size: S");

        let red_m = resolve(&variants, &selection(&[("Color", "Red"), ("Size", "M")]))
            .unwrap()
            .expect("Red/M is offered");
        assert_eq!(red_m.stock, 0);
        assert!(!red_m.in_stock());
    }

    #[test]
    fn duplicate_combination_is_reported_not_picked() {
        let mut variants = classic_tee();
        // Same combination as TEE-RED-S but a different price; picking
        // either silently would surface an untrustworthy price
        variants.push(variant(
            "TEE-RED-S-DUP",
            dec!(9.99),
            1,
            &[("Color", "Red"), ("Size", "S")],
        ));

        let result = resolve(&variants, &selection(&[("Color", "Red"), ("Size", "S")]));
        assert_eq!(result, Err(VariantResolveError::AmbiguousSelection));
    }

    #[test]
    fn product_without_options_resolves_with_empty_selection() {
        let variants = vec![variant("ONLY", dec!(5.00), 2, &[])];
        let resolved = resolve(&variants, &HashMap::new()).unwrap();
        assert_eq!(resolved.map(|v| v.sku.as_str()), Some("ONLY"));
    }
}
