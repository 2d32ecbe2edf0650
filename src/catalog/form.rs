//! State of the product creation form

use super::{CatalogClient, NewProductDraft};
use crate::error::ApiError;

/// The creation form: a draft plus whether the form is showing
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub draft: NewProductDraft,
    is_open: bool,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Show the form, keeping whatever the draft already holds
    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Hide the form without submitting
    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Send the draft. Success closes the form and resets the draft; failure
    /// leaves both as they were so the user can fix and resend.
    pub async fn submit(&mut self, catalog: &CatalogClient) -> Result<(), ApiError> {
        catalog.create_product(&self.draft).await?;
        self.draft.reset();
        self.is_open = false;
        Ok(())
    }
}
