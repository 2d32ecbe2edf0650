//! Product catalog requests against the admin API

mod form;
mod types;

use log::{info, warn};
use reqwest::Client;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::AdminConfig;
use crate::error::{ApiError, StorageError};
use crate::fetch::{server_message, Fetch};
use crate::prompt::Prompt;
use crate::session::SessionContext;

pub use form::*;
pub use types::*;

/// Question asked before a product is deleted
pub const DELETE_CONFIRMATION: &str = "Delete this product?";

/// Client for the product endpoints. Holds the last fetched catalog.
pub struct CatalogClient {
    config: Arc<AdminConfig>,
    client: Client,
    context: Arc<SessionContext>,
    prompt: Arc<dyn Prompt>,
    catalog: RwLock<Catalog>,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(
        config: Arc<AdminConfig>,
        client: Client,
        context: Arc<SessionContext>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        Self {
            config,
            client,
            context,
            prompt,
            catalog: RwLock::new(Catalog::default()),
        }
    }

    fn read_catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_catalog(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_token(&self) -> Result<String, ApiError> {
        self.context
            .usable_token()
            .unwrap_or_else(storage_miss)
            .ok_or(ApiError::NotAuthenticated)
    }

    /// Fetch every product and replace the cached catalog with them.
    ///
    /// Without a stored token this fails with
    /// [`ApiError::NotAuthenticated`] and sends nothing.
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let token = self.require_token()?;

        let response = Fetch::get(&self.client, &self.config.products_url())
            .authorization(Some(&token))
            .execute::<ProductsResponse>()
            .await?;

        info!("fetched {} products", response.products.len());
        self.write_catalog().replace(response.products.clone());
        Ok(response.products)
    }

    /// Create a product from a draft. Prices are sent as numbers.
    pub async fn create_product(&self, draft: &NewProductDraft) -> Result<(), ApiError> {
        let token = self.require_token()?;
        let payload = draft.to_payload()?;

        let response = Fetch::post(&self.client, &self.config.product_url())
            .authorization(Some(&token))
            .json(&Envelope { data: &payload })?
            .execute::<serde_json::Value>()
            .await?;

        info!(
            "created product {:?}: {}",
            payload.title,
            server_message(&response).unwrap_or_default()
        );
        Ok(())
    }

    /// Delete a product after asking for confirmation.
    ///
    /// Returns `Ok(false)` when the confirmation is declined, in which case
    /// no request is sent. On success exactly the entry with `id` leaves the
    /// cached catalog; on failure the catalog is untouched.
    pub async fn delete_product(&self, id: &str) -> Result<bool, ApiError> {
        if !self.prompt.confirm(DELETE_CONFIRMATION).await {
            return Ok(false);
        }

        let token = match self.context.default_authorization() {
            Some(token) => token,
            None => self.require_token()?,
        };
        let url = self.config.product_item_url(id)?;

        let result = Fetch::delete(&self.client, &url)
            .authorization(Some(&token))
            .execute::<serde_json::Value>()
            .await;

        match result {
            Ok(_) => {
                self.write_catalog().remove(id);
                info!("deleted product {}", id);
                Ok(true)
            }
            Err(err) => {
                warn!("failed to delete product {}: {}", id, err);
                Err(err.into())
            }
        }
    }

    /// Whether the cached catalog belongs to a session that is gone. Stale
    /// data is never handed out.
    pub fn is_stale(&self) -> bool {
        self.context.usable_token().unwrap_or_else(storage_miss).is_none()
    }

    /// The cached product with `id`, for a details view
    pub fn product_details(&self, id: &str) -> Option<Product> {
        if self.is_stale() {
            return None;
        }
        self.read_catalog().get(id).cloned()
    }

    /// A draft prefilled from the cached product with `id`. No update request
    /// exists, so this only copies data.
    pub fn edit_draft(&self, id: &str) -> Option<NewProductDraft> {
        self.product_details(id)
            .map(|product| NewProductDraft::from_product(&product))
    }

    /// Snapshot of the cached catalog in server order
    pub fn products(&self) -> Vec<Product> {
        if self.is_stale() {
            return Vec::new();
        }
        self.read_catalog().products().to_vec()
    }

    /// Forget the cached catalog
    pub fn clear_cache(&self) {
        self.write_catalog().replace(Vec::new());
    }
}

fn storage_miss(err: StorageError) -> Option<String> {
    warn!("session storage unavailable: {}", err);
    None
}

