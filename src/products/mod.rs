//! Collection of extracted product crops and their metadata.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::raster::CropPayload;

const PLACEHOLDER_NAME: &str = "Analyzing...";
const PLACEHOLDER_PRICE: &str = "...";
const ORIGINAL_VERSION_PROMPT: &str = "Original";
const SAVED_VERSION_PROMPT: &str = "Last saved edit";

/// History entry recorded when a product goes back to its original crop.
pub const REVERT_HISTORY_ENTRY: &str = "Reverted to original";

static NEXT_PRODUCT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Receiver of finished crops. Assigns and returns the product id.
pub trait ProductSink {
    fn receive(&mut self, payload: CropPayload) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Name,
    Price,
}

/// Name and price read from a crop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedProduct {
    pub id: String,
    pub original_crop: Vec<u8>,
    pub processed_image: Option<Vec<u8>>,
    pub name: String,
    pub price: String,
    pub status: ProductStatus,
    pub edit_history: Vec<String>,
}

impl ExtractedProduct {
    fn from_payload(id: String, payload: CropPayload) -> Self {
        Self {
            id,
            original_crop: payload.png,
            processed_image: None,
            name: PLACEHOLDER_NAME.to_string(),
            price: PLACEHOLDER_PRICE.to_string(),
            status: ProductStatus::Pending,
            edit_history: Vec::new(),
        }
    }

    /// Image to export: the latest edit if any, else the original crop.
    pub fn export_image(&self) -> &[u8] {
        self.processed_image.as_deref().unwrap_or(&self.original_crop)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditVersion {
    pub image: Vec<u8>,
    pub prompt: String,
}

/// Editing timeline for one product. Version 0 is always the original crop;
/// a previously saved edit follows it. New edits chain from the selected
/// version and become the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTimeline {
    product_id: String,
    versions: Vec<EditVersion>,
    current: usize,
}

impl EditTimeline {
    pub fn for_product(product: &ExtractedProduct) -> Self {
        let mut versions = vec![EditVersion {
            image: product.original_crop.clone(),
            prompt: ORIGINAL_VERSION_PROMPT.to_string(),
        }];
        if let Some(processed) = &product.processed_image {
            versions.push(EditVersion {
                image: processed.clone(),
                prompt: SAVED_VERSION_PROMPT.to_string(),
            });
        }
        let current = versions.len() - 1;
        Self {
            product_id: product.id.clone(),
            versions,
            current,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn versions(&self) -> &[EditVersion] {
        &self.versions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn active(&self) -> &EditVersion {
        &self.versions[self.current]
    }

    pub fn is_original_selected(&self) -> bool {
        self.current == 0
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.versions.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn push(&mut self, image: Vec<u8>, prompt: impl Into<String>) {
        self.versions.push(EditVersion {
            image,
            prompt: prompt.into(),
        });
        self.current = self.versions.len() - 1;
    }
}

fn generate_product_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let seq = NEXT_PRODUCT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("product-{nanos:x}-{seq}")
}

/// Download file name: every whitespace run in the name, leading and
/// trailing ones included, becomes `_`; the price keeps only digits and commas.
pub fn download_file_name(product: &ExtractedProduct) -> String {
    let mut name = String::with_capacity(product.name.len());
    let mut in_whitespace = false;
    for c in product.name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.push(c);
            in_whitespace = false;
        }
    }
    let price = product
        .price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect::<String>();
    format!("{name}_{price}.png")
}

/// Products newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCollection {
    products: Vec<ExtractedProduct>,
}

impl ProductCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products(products: Vec<ExtractedProduct>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[ExtractedProduct] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ExtractedProduct> {
        self.products.iter().find(|product| product.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ExtractedProduct> {
        self.products.iter_mut().find(|product| product.id == id)
    }

    pub fn apply_details(&mut self, id: &str, details: ProductDetails) -> bool {
        let Some(product) = self.get_mut(id) else {
            return false;
        };
        product.name = details.name;
        product.price = details.price;
        product.status = ProductStatus::Completed;
        true
    }

    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(product) = self.get_mut(id) else {
            return false;
        };
        product.status = ProductStatus::Processing;
        true
    }

    pub fn record_edit(&mut self, id: &str, image: Vec<u8>, prompt: impl Into<String>) -> bool {
        let Some(product) = self.get_mut(id) else {
            return false;
        };
        product.processed_image = Some(image);
        product.edit_history.push(prompt.into());
        product.status = ProductStatus::Completed;
        true
    }

    /// Drops any edit so the original crop is exported again.
    pub fn revert_to_original(&mut self, id: &str) -> bool {
        let Some(product) = self.get_mut(id) else {
            return false;
        };
        product.processed_image = None;
        product.edit_history.push(REVERT_HISTORY_ENTRY.to_string());
        product.status = ProductStatus::Completed;
        true
    }

    /// Stores the version selected in `timeline` as the product's image.
    pub fn save_version(&mut self, timeline: &EditTimeline) -> bool {
        if timeline.is_original_selected() {
            return self.revert_to_original(timeline.product_id());
        }
        let version = timeline.active();
        self.record_edit(
            timeline.product_id(),
            version.image.clone(),
            version.prompt.clone(),
        )
    }

    pub fn mark_failed(&mut self, id: &str) -> bool {
        let Some(product) = self.get_mut(id) else {
            return false;
        };
        product.status = ProductStatus::Failed;
        true
    }

    pub fn update_field(
        &mut self,
        id: &str,
        field: ProductField,
        value: impl Into<String>,
    ) -> bool {
        let Some(product) = self.get_mut(id) else {
            return false;
        };
        match field {
            ProductField::Name => product.name = value.into(),
            ProductField::Price => product.price = value.into(),
        }
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<ExtractedProduct> {
        let index = self.products.iter().position(|product| product.id == id)?;
        Some(self.products.remove(index))
    }

    pub fn clear(&mut self) {
        self.products.clear();
    }
}

/// Working document: the uploaded leaflet and everything cut from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafletState {
    pub original_image: Option<Vec<u8>>,
    pub products: ProductCollection,
    pub is_analyzing: bool,
}

impl LeafletState {
    pub fn with_image(png: Vec<u8>) -> Self {
        Self {
            original_image: Some(png),
            ..Self::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.original_image.is_some()
    }
}

impl ProductSink for ProductCollection {
    fn receive(&mut self, payload: CropPayload) -> String {
        let id = generate_product_id();
        self.products.insert(0, ExtractedProduct::from_payload(id.clone(), payload));
        id
    }
}
