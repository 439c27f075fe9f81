//! Agent-side product catalog.
//!
//! UCP does not yet define product discovery, so the agent carries a small
//! catalog of merchant product ids and titles. Search is a linear keyword scan.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolkitError};

/// Product known to the agent.
///
/// `id` must match the merchant's item identifier; `title` is the search key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Merchant item identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Creates a product with only id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), description: None, image_url: None }
    }

    fn matches_any(&self, keywords: &[String]) -> bool {
        let searchable = format!("{} {}", self.title, self.id).to_lowercase();
        keywords.iter().any(|keyword| searchable.contains(keyword.as_str()))
    }
}

/// Result of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSearchResult {
    /// Matching products in catalog order.
    pub products: Vec<Product>,
    /// Query as supplied.
    pub query: String,
    /// Number of matching products.
    pub total: usize,
}

/// Ordered, read-only product list with unique ids.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::DuplicateProductId`] if two products share an id.
    ///
    /// # Examples
    ///
    /// ```
    /// use ucp_toolkit::catalog::{Catalog, Product};
    ///
    /// let catalog = Catalog::new(vec![
    ///     Product::new("roses", "Red Roses"),
    ///     Product::new("tulips", "Spring Tulips"),
    /// ])?;
    ///
    /// let result = catalog.search("rose");
    /// assert_eq!(result.total, 1);
    /// assert_eq!(result.products[0].id, "roses");
    /// # Ok::<(), ucp_toolkit::ToolkitError>(())
    /// ```
    pub fn new(products: Vec<Product>) -> Result<Self> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if index.insert(product.id.clone(), position).is_some() {
                return Err(ToolkitError::DuplicateProductId(product.id.clone()));
            }
        }
        Ok(Self { products, index })
    }

    /// Returns the product with this id.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.index.get(product_id).map(|&position| &self.products[position])
    }

    /// Searches titles and ids for any of the whitespace-separated keywords.
    ///
    /// Matching is case-insensitive substring matching. No match yields an
    /// empty result.
    #[must_use]
    pub fn search(&self, query: &str) -> ProductSearchResult {
        let keywords: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_owned).collect();

        let products: Vec<Product> =
            self.products.iter().filter(|p| p.matches_any(&keywords)).cloned().collect();

        ProductSearchResult { total: products.len(), products, query: query.to_owned() }
    }

    /// Returns all products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Returns the number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn flowers() -> Catalog {
        Catalog::new(vec![
            Product::new("roses", "Red Roses"),
            Product::new("tulips", "Spring Tulips"),
            Product::new("pot-ceramic", "Ceramic Pot"),
        ])
        .unwrap()
    }

    #[test]
    fn test_search_title_substring() {
        let catalog = Catalog::new(vec![
            Product::new("roses", "Red Roses"),
            Product::new("tulips", "Spring Tulips"),
        ])
        .unwrap();

        let result = catalog.search("rose");
        assert_eq!(result.total, 1);
        assert_eq!(result.products, vec![Product::new("roses", "Red Roses")]);
        assert_eq!(result.query, "rose");
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let result = flowers().search("orchid");
        assert!(result.products.is_empty());
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_search_empty_query_is_empty() {
        assert_eq!(flowers().search("   ").total, 0);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let result = flowers().search("TULIP");
        assert_eq!(result.products[0].id, "tulips");
    }

    #[test]
    fn test_search_matches_id() {
        let result = flowers().search("pot-ceramic");
        assert_eq!(result.total, 1);
    }

    #[test]
    fn test_search_any_keyword_keeps_catalog_order() {
        let result = flowers().search("pot roses");
        let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["roses", "pot-ceramic"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::new(vec![
            Product::new("roses", "Red Roses"),
            Product::new("roses", "White Roses"),
        ]);
        assert!(matches!(result, Err(ToolkitError::DuplicateProductId(id)) if id == "roses"));
    }

    #[test]
    fn test_get_by_id() {
        let catalog = flowers();
        assert_eq!(catalog.get("tulips").map(|p| p.title.as_str()), Some("Spring Tulips"));
        assert!(catalog.get("orchids").is_none());
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_product_deserializes_without_optionals() {
        let product: Product = serde_json::from_str(r#"{"id":"a","title":"A"}"#).unwrap();
        assert!(product.description.is_none());
        assert!(product.image_url.is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_search_results_contain_a_keyword(
            titles in proptest::collection::vec("[a-z]{1,8}( [a-z]{1,8})?", 1..12),
            query in "[a-z]{1,4}( [a-z]{1,4})?",
        ) {
            let products: Vec<Product> = titles
                .iter()
                .enumerate()
                .map(|(i, title)| Product::new(format!("p{i}"), title.clone()))
                .collect();
            let catalog = Catalog::new(products).unwrap();
            let result = catalog.search(&query);

            prop_assert_eq!(result.total, result.products.len());
            for product in &result.products {
                let searchable = format!("{} {}", product.title, product.id);
                prop_assert!(query.split_whitespace().any(|k| searchable.contains(k)));
            }
        }

        #[test]
        fn test_search_by_exact_id_finds_product(count in 1usize..20, pick in 0usize..20) {
            let pick = pick % count;
            let products: Vec<Product> =
                (0..count).map(|i| Product::new(format!("sku{i:03}"), "Item")).collect();
            let catalog = Catalog::new(products).unwrap();
            let wanted = format!("sku{pick:03}");
            let result = catalog.search(&wanted);

            prop_assert!(result.products.iter().any(|p| p.id == wanted));
        }
    }
}
