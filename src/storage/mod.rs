use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::{ExtractedProduct, LeafletState, ProductCollection, ProductStatus};

const SETTINGS_FILE: &str = "settings.json";
const SESSION_FILE: &str = "session.json";
const ORIGINAL_IMAGE_FILE: &str = "original.png";
const PRODUCTS_SUBDIR: &str = "products";
const TEMP_SUFFIX: &str = ".tmp";

const SETTINGS_RECORD_ID: &str = "user-config";
const SESSION_RECORD_ID: &str = "current-session";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("product id is empty")]
    MissingProductId,
    #[error("record {found:?} does not match expected {expected}")]
    UnexpectedRecord {
        expected: &'static str,
        found: String,
    },
    #[error("malformed record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub name: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Record<T> {
    id: String,
    #[serde(flatten)]
    data: T,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    has_original_image: bool,
    is_analyzing: bool,
    products: Vec<StoredProduct>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredProduct {
    id: String,
    name: String,
    price: String,
    status: ProductStatus,
    #[serde(default)]
    edit_history: Vec<String>,
    has_processed_image: bool,
}

/// Directory-backed store for the user settings and the current session.
/// JSON records hold metadata; crops are kept as PNG files next to them.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn products_dir(&self) -> PathBuf {
        self.root.join(PRODUCTS_SUBDIR)
    }

    pub fn original_image_path(&self) -> PathBuf {
        self.root.join(ORIGINAL_IMAGE_FILE)
    }

    pub fn product_image_path(&self, product_id: &str) -> StorageResult<PathBuf> {
        validate_product_id(product_id)?;
        Ok(self.products_dir().join(format!("{product_id}.png")))
    }

    pub fn processed_image_path(&self, product_id: &str) -> StorageResult<PathBuf> {
        validate_product_id(product_id)?;
        Ok(self.products_dir().join(format!("{product_id}-processed.png")))
    }

    pub fn save_settings(&self, settings: &UserSettings) -> StorageResult<()> {
        fs::create_dir_all(&self.root)?;
        write_record(&self.root.join(SETTINGS_FILE), SETTINGS_RECORD_ID, settings)?;
        tracing::debug!(root = %self.root.display(), "settings saved");
        Ok(())
    }

    pub fn load_settings(&self) -> StorageResult<Option<UserSettings>> {
        read_record(&self.root.join(SETTINGS_FILE), SETTINGS_RECORD_ID)
    }

    /// Replaces the stored session. Images are written first and the session
    /// record last, each through a rename, so an interrupted save leaves the
    /// previous record and its images readable. Images no longer referenced
    /// are pruned once the new record is in place.
    pub fn save_session(&self, state: &LeafletState) -> StorageResult<()> {
        for product in state.products.products() {
            validate_product_id(&product.id)?;
        }
        let products_dir = self.products_dir();
        fs::create_dir_all(&products_dir)?;

        if let Some(png) = &state.original_image {
            write_atomic(&self.original_image_path(), png)?;
        }

        let mut keep = HashSet::new();
        let mut products = Vec::with_capacity(state.products.len());
        for product in state.products.products() {
            let crop_path = self.product_image_path(&product.id)?;
            write_atomic(&crop_path, &product.original_crop)?;
            keep.insert(crop_path);
            if let Some(processed) = &product.processed_image {
                let processed_path = self.processed_image_path(&product.id)?;
                write_atomic(&processed_path, processed)?;
                keep.insert(processed_path);
            }
            products.push(StoredProduct {
                id: product.id.clone(),
                name: product.name.clone(),
                price: product.price.clone(),
                status: product.status,
                edit_history: product.edit_history.clone(),
                has_processed_image: product.processed_image.is_some(),
            });
        }

        let session = StoredSession {
            has_original_image: state.original_image.is_some(),
            is_analyzing: state.is_analyzing,
            products,
        };
        write_record(&self.root.join(SESSION_FILE), SESSION_RECORD_ID, &session)?;

        if state.original_image.is_none() {
            remove_file_if_exists(&self.original_image_path())?;
        }
        let pruned = prune_unreferenced(&products_dir, &keep);
        tracing::debug!(
            root = %self.root.display(),
            products = state.products.len(),
            pruned,
            "session saved"
        );
        Ok(())
    }

    /// Loads the stored session. Images that went missing are logged and
    /// skipped: a product without its crop is dropped, a missing edit falls
    /// back to the crop.
    pub fn load_session(&self) -> StorageResult<Option<LeafletState>> {
        let Some(session) =
            read_record::<StoredSession>(&self.root.join(SESSION_FILE), SESSION_RECORD_ID)?
        else {
            return Ok(None);
        };

        let original_image = if session.has_original_image {
            read_image(&self.original_image_path())?
        } else {
            None
        };

        let mut products = Vec::with_capacity(session.products.len());
        for stored in session.products {
            let Some(original_crop) = read_image(&self.product_image_path(&stored.id)?)? else {
                continue;
            };
            let processed_image = if stored.has_processed_image {
                read_image(&self.processed_image_path(&stored.id)?)?
            } else {
                None
            };
            products.push(ExtractedProduct {
                id: stored.id,
                original_crop,
                processed_image,
                name: stored.name,
                price: stored.price,
                status: stored.status,
                edit_history: stored.edit_history,
            });
        }

        Ok(Some(LeafletState {
            original_image,
            products: ProductCollection::from_products(products),
            is_analyzing: session.is_analyzing,
        }))
    }

    /// Deletes both records and every stored image.
    pub fn clear_all(&self) -> StorageResult<()> {
        remove_file_if_exists(&self.root.join(SETTINGS_FILE))?;
        remove_file_if_exists(&self.root.join(SESSION_FILE))?;
        remove_file_if_exists(&self.original_image_path())?;
        remove_dir_if_exists(&self.products_dir())?;
        tracing::info!(root = %self.root.display(), "stored data cleared");
        Ok(())
    }
}

fn validate_product_id(product_id: &str) -> StorageResult<()> {
    if product_id.is_empty() {
        return Err(StorageError::MissingProductId);
    }
    Ok(())
}

/// Writes through a sibling temp file and a rename, so readers never see a
/// partially written file.
fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(TEMP_SUFFIX);
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn read_image(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "stored image is missing; skipping");
            Ok(None)
        }
        Err(err) => Err(StorageError::Io(err)),
    }
}

/// Removes files in `dir` that are not in `keep`. Failures are logged, since
/// the new record is already in place.
fn prune_unreferenced(dir: &Path, keep: &HashSet<PathBuf>) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), ?err, "failed to list stored images");
            return 0;
        }
    };

    let mut removed = 0;
    for path in entries.filter_map(|entry| entry.ok().map(|entry| entry.path())) {
        if !path.is_file() || keep.contains(&path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => {
                tracing::warn!(path = %path.display(), ?err, "failed to remove stale image");
            }
        }
    }
    removed
}

fn write_record<T: Serialize>(path: &Path, id: &str, data: &T) -> StorageResult<()> {
    let record = Record {
        id: id.to_string(),
        data,
    };
    let json = serde_json::to_string_pretty(&record).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

fn read_record<T: for<'de> Deserialize<'de>>(
    path: &Path,
    expected: &'static str,
) -> StorageResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StorageError::Io(err)),
    };
    let record: Record<T> = serde_json::from_str(&contents).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if record.id != expected {
        return Err(StorageError::UnexpectedRecord {
            expected,
            found: record.id,
        });
    }
    Ok(Some(record.data))
}

fn remove_file_if_exists(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StorageError::Io(err)),
    }
}

fn remove_dir_if_exists(path: &Path) -> StorageResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StorageError::Io(err)),
    }
}
