use serde::Deserialize;
use serde_json::Value;

use crate::products::{EditTimeline, ProductCollection, ProductDetails};

const UNKNOWN_PRODUCT_NAME: &str = "Unknown product";
const FALLBACK_PRODUCT_NAME: &str = "Product";

#[derive(Debug, thiserror::Error)]
pub enum IntelligenceError {
    #[error("api key is not configured")]
    MissingApiKey,
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("model returned no image: {reason}")]
    NoImageReturned { reason: String },
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("product not found: {id}")]
    ProductNotFound { id: String },
}

pub type IntelligenceResult<T> = Result<T, IntelligenceError>;

/// External generative-image service. Implementations own transport, model
/// choice and credentials; callers only see these two contracts.
pub trait ImageIntelligence {
    /// Applies a free-form edit instruction to a PNG crop, returning a new PNG.
    fn edit_image(&self, png: &[u8], prompt: &str) -> IntelligenceResult<Vec<u8>>;
    /// Reads the product name and price printed on a crop.
    fn identify_product(&self, png: &[u8]) -> IntelligenceResult<ProductDetails>;
}

#[derive(Debug, Default, Deserialize)]
struct RawDetails {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    price: Option<Value>,
}

/// Loose reading of a reply field: strings as-is, numbers in their JSON
/// form, anything else empty.
fn field_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Drops a surrounding Markdown code fence, with or without a `json` tag.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.strip_suffix('\n').unwrap_or(rest).trim()
}

/// Parses the OCR model's JSON reply. Blank replies parse as an empty object.
pub fn parse_product_details(text: &str) -> IntelligenceResult<ProductDetails> {
    let body = strip_code_fence(text);
    let body = if body.is_empty() { "{}" } else { body };
    let raw: RawDetails =
        serde_json::from_str(body).map_err(|err| IntelligenceError::InvalidResponse {
            message: err.to_string(),
        })?;

    let mut name = field_text(raw.name);
    if name.trim().is_empty() {
        name = UNKNOWN_PRODUCT_NAME.to_string();
    }
    Ok(ProductDetails {
        name,
        price: field_text(raw.price),
    })
}

/// Runs OCR for a freshly extracted product. Failures never abort the flow:
/// the product is completed with a generic name and an empty price.
pub fn enrich_product<I: ImageIntelligence + ?Sized>(
    collection: &mut ProductCollection,
    id: &str,
    intelligence: &I,
) -> IntelligenceResult<ProductDetails> {
    let crop = collection
        .get(id)
        .map(|product| product.original_crop.clone())
        .ok_or_else(|| IntelligenceError::ProductNotFound { id: id.to_string() })?;

    let details = intelligence.identify_product(&crop).unwrap_or_else(|err| {
        tracing::warn!(%err, id, "product recognition failed; using fallback details");
        ProductDetails {
            name: FALLBACK_PRODUCT_NAME.to_string(),
            price: String::new(),
        }
    });
    collection.apply_details(id, details.clone());
    Ok(details)
}

/// Applies an AI edit to the product's current export image and records the
/// prompt. A failed edit marks the product `Failed` and returns the error.
pub fn apply_image_edit<I: ImageIntelligence + ?Sized>(
    collection: &mut ProductCollection,
    id: &str,
    prompt: &str,
    intelligence: &I,
) -> IntelligenceResult<()> {
    let source = collection
        .get(id)
        .map(|product| product.export_image().to_vec())
        .ok_or_else(|| IntelligenceError::ProductNotFound { id: id.to_string() })?;

    collection.begin_edit(id);
    match intelligence.edit_image(&source, prompt) {
        Ok(edited) => {
            tracing::info!(id, prompt, bytes = edited.len(), "product image edited");
            collection.record_edit(id, edited, prompt);
            Ok(())
        }
        Err(err) => {
            tracing::warn!(%err, id, prompt, "product image edit failed");
            collection.mark_failed(id);
            Err(err)
        }
    }
}

/// Edits the version selected in `timeline` and appends the result as the
/// new selection. The product itself is untouched until the timeline is saved.
pub fn edit_version<I: ImageIntelligence + ?Sized>(
    timeline: &mut EditTimeline,
    prompt: &str,
    intelligence: &I,
) -> IntelligenceResult<()> {
    let edited = intelligence
        .edit_image(&timeline.active().image, prompt)
        .inspect_err(|err| {
            tracing::warn!(%err, id = timeline.product_id(), prompt, "version edit failed");
        })?;
    tracing::debug!(id = timeline.product_id(), prompt, "version added");
    timeline.push(edited, prompt);
    Ok(())
}
