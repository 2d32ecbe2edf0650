#![allow(dead_code)]

use async_trait::async_trait;
use catalog_admin::config::AdminConfig;
use catalog_admin::prompt::Prompt;
use catalog_admin::storage::{MemoryStorage, Storage, EXPIRATION_KEY, TOKEN_KEY};
use catalog_admin::CatalogAdmin;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

pub const API_PATH: &str = "shop";
pub const TOKEN: &str = "test-token";

/// Prompt that records notices and gives a fixed confirmation answer
pub struct RecordingPrompt {
    answer: bool,
    notices: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            answer: true,
            notices: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        })
    }

    pub fn declining() -> Arc<Self> {
        Arc::new(Self {
            answer: false,
            notices: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        })
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompt for RecordingPrompt {
    async fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    async fn confirm(&self, message: &str) -> bool {
        self.questions.lock().unwrap().push(message.to_string());
        self.answer
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn config_for(server: &MockServer) -> AdminConfig {
    AdminConfig::new(&server.uri(), API_PATH).unwrap()
}

pub fn admin_with(
    config: AdminConfig,
    storage: Arc<MemoryStorage>,
    prompt: Arc<RecordingPrompt>,
) -> CatalogAdmin {
    CatalogAdmin::new(config, storage, prompt).unwrap()
}

/// Client over fresh storage and an accepting prompt
pub fn setup(server: &MockServer) -> (CatalogAdmin, Arc<MemoryStorage>, Arc<RecordingPrompt>) {
    let storage = Arc::new(MemoryStorage::new());
    let prompt = RecordingPrompt::accepting();
    let admin = admin_with(config_for(server), storage.clone(), prompt.clone());
    (admin, storage, prompt)
}

/// Put a token and an expiry `ttl` from now into durable storage
pub fn store_session(storage: &MemoryStorage, ttl: Duration) -> i64 {
    let expires_at = now_ms() + ttl.as_millis() as i64;
    storage.set_item(TOKEN_KEY, TOKEN).unwrap();
    storage
        .set_item(EXPIRATION_KEY, &expires_at.to_string())
        .unwrap();
    expires_at
}

pub fn sign_in_body() -> Value {
    json!({
        "success": true,
        "message": "登入成功",
        "uid": "uid-1",
        "token": TOKEN,
        "expired": 1_000
    })
}

pub fn products_body(ids: &[&str]) -> Value {
    let products: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "title": format!("Product {}", id),
                "category": "tools",
                "unit": "pcs",
                "origin_price": 100,
                "price": 80,
                "description": "",
                "content": "",
                "is_enabled": 1,
                "imageUrl": "",
                "imagesUrl": []
            })
        })
        .collect();
    json!({ "success": true, "products": products, "pagination": {} })
}

pub fn products_path() -> String {
    format!("/v2/api/{}/admin/products", API_PATH)
}

pub fn product_path() -> String {
    format!("/v2/api/{}/admin/product", API_PATH)
}
