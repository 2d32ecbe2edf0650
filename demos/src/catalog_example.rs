use catalog_admin::catalog::{NewProductDraft, ProductForm};
use catalog_admin::config::AdminConfig;
use catalog_admin::prompt::AutoPrompt;
use catalog_admin::session::Credentials;
use catalog_admin::storage::MemoryStorage;
use catalog_admin::CatalogAdmin;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();
    pretty_env_logger::init();

    let config = AdminConfig::from_env()?;
    let username = env::var("CATALOG_USERNAME").expect("CATALOG_USERNAME must be set");
    let password = env::var("CATALOG_PASSWORD").expect("CATALOG_PASSWORD must be set");

    let admin = CatalogAdmin::new(
        config,
        Arc::new(MemoryStorage::new()),
        Arc::new(AutoPrompt::accepting()),
    )?;

    println!("Signing in as {}", username);
    let products = admin
        .sign_in(&Credentials::new(&username, &password))
        .await?;
    println!("{} products before", products.len());

    let mut form = ProductForm::new();
    form.open();
    form.draft = NewProductDraft::new("Demo widget", "100", "80");
    form.draft.category = "demo".to_string();
    form.draft.unit = "pcs".to_string();
    form.submit(admin.catalog()).await?;
    println!("Created demo product, form open: {}", form.is_open());

    let products = admin.catalog().list_products().await?;
    if let Some(created) = products.iter().find(|p| p.title == "Demo widget") {
        println!("Created product details: {:?}", admin.catalog().product_details(&created.id));

        let deleted = admin.catalog().delete_product(&created.id).await?;
        println!("Deleted demo product: {}", deleted);
    }

    println!("{} products after", admin.catalog().products().len());

    admin.logout();
    println!("Signed out, session: {:?}", admin.session().session());

    Ok(())
}
