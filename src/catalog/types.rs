//! Types for the product catalog

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ApiError;

/// A product as returned by the admin API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub unit: String,

    #[serde(default, deserialize_with = "lenient_number")]
    pub origin_price: f64,

    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub content: String,

    /// Sent by the API as either a bool or 0/1
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_enabled: bool,

    #[serde(default, rename = "imageUrl")]
    pub image_url: String,

    #[serde(default, rename = "imagesUrl")]
    pub images_url: Vec<String>,
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|v| v != 0.0).unwrap_or(false)),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("expected bool or 0/1, got {}", other))),
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => coerce_price(&s).map_err(de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

/// Whole numbers go on the wire as integers, like a JavaScript client would
/// send them
fn wire_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn wire_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Convert user-typed price text to a number. Blank text is zero.
pub fn coerce_price(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{:?} is not a number", raw)),
    }
}

/// Response of the product listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub products: Vec<Product>,
}

/// Unsaved product form state. Prices are kept as the text the user typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProductDraft {
    pub title: String,
    pub category: String,
    pub unit: String,
    pub origin_price: String,
    pub price: String,
    pub description: String,
    pub content: String,
    pub is_enabled: bool,
    pub image_url: String,
    pub images_url: Vec<String>,
}

impl NewProductDraft {
    /// Start a draft with a title and the two prices
    pub fn new(title: &str, origin_price: &str, price: &str) -> Self {
        Self {
            title: title.to_string(),
            origin_price: origin_price.to_string(),
            price: price.to_string(),
            ..Default::default()
        }
    }

    /// Copy an existing product into a draft
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            origin_price: product.origin_price.to_string(),
            price: product.price.to_string(),
            description: product.description.clone(),
            content: product.content.clone(),
            is_enabled: product.is_enabled,
            image_url: product.image_url.clone(),
            images_url: product.images_url.clone(),
        }
    }

    /// Back to an empty form
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Build the request body, coercing the price text to numbers
    pub fn to_payload(&self) -> Result<ProductPayload, ApiError> {
        let origin_price = coerce_price(&self.origin_price)
            .map_err(|e| ApiError::InvalidDraft(format!("origin_price: {}", e)))?;
        let price = coerce_price(&self.price)
            .map_err(|e| ApiError::InvalidDraft(format!("price: {}", e)))?;

        Ok(ProductPayload {
            title: self.title.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
            origin_price,
            price,
            description: self.description.clone(),
            content: self.content.clone(),
            is_enabled: self.is_enabled,
            image_url: self.image_url.clone(),
            images_url: self.images_url.clone(),
        })
    }
}

/// Product fields as the creation endpoint expects them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPayload {
    pub title: String,
    pub category: String,
    pub unit: String,
    #[serde(serialize_with = "wire_number")]
    pub origin_price: f64,
    #[serde(serialize_with = "wire_number")]
    pub price: f64,
    pub description: String,
    pub content: String,
    #[serde(serialize_with = "wire_flag")]
    pub is_enabled: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imagesUrl")]
    pub images_url: Vec<String>,
}

/// The `{"data": ...}` wrapper the API puts around write payloads
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T> {
    pub data: &'a T,
}

/// Products last fetched from the API, keyed by id, in server order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Replace everything with a fresh listing
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    /// Remove the product with `id`, returning it
    pub fn remove(&mut self, id: &str) -> Option<Product> {
        let index = self.products.iter().position(|p| p.id == id)?;
        Some(self.products.remove(index))
    }

    /// Look up a product by id
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// All products in server order
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}
