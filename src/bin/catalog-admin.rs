use async_trait::async_trait;
use catalog_admin::catalog::{NewProductDraft, Product, ProductForm};
use catalog_admin::config::AdminConfig;
use catalog_admin::error::{ApiError, Error};
use catalog_admin::prompt::Prompt;
use catalog_admin::session::Credentials;
use catalog_admin::storage::FileStorage;
use catalog_admin::CatalogAdmin;
use clap::{Arg, ArgMatches, Command};
use dotenv::dotenv;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prompt that prints notices to stderr and reads y/N answers from stdin
struct TerminalPrompt {
    assume_yes: bool,
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }

    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", message);
        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn cli() -> Command<'static> {
    Command::new("catalog-admin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage a product catalog through the admin API")
        .subcommand_required(true)
        .arg(
            Arg::new("state")
                .long("state")
                .value_name("FILE")
                .help("File holding the stored session")
                .takes_value(true)
                .default_value(".catalog-admin.json")
                .global(true),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Answer yes to every confirmation")
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and list products")
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .takes_value(true)
                        .help("Falls back to CATALOG_PASSWORD"),
                ),
        )
        .subcommand(Command::new("list").about("List products"))
        .subcommand(
            Command::new("show")
                .about("Show one product")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("create")
                .about("Create a product")
                .arg(Arg::new("title").long("title").takes_value(true).required(true))
                .arg(Arg::new("category").long("category").takes_value(true))
                .arg(Arg::new("unit").long("unit").takes_value(true))
                .arg(Arg::new("origin-price").long("origin-price").takes_value(true))
                .arg(Arg::new("price").long("price").takes_value(true))
                .arg(Arg::new("description").long("description").takes_value(true))
                .arg(Arg::new("content").long("content").takes_value(true))
                .arg(Arg::new("image-url").long("image-url").takes_value(true))
                .arg(Arg::new("enabled").long("enabled")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a product")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(Command::new("status").about("Show the stored session"))
        .subcommand(Command::new("logout").about("Forget the stored session"))
}

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products");
        return;
    }
    println!(
        "{:<24} {:<12} {:<24} {:>10} {:>10}  {}",
        "ID", "CATEGORY", "TITLE", "ORIGIN", "PRICE", "ENABLED"
    );
    for p in products {
        println!(
            "{:<24} {:<12} {:<24} {:>10} {:>10}  {}",
            p.id,
            p.category,
            p.title,
            p.origin_price,
            p.price,
            if p.is_enabled { "yes" } else { "no" }
        );
    }
}

fn print_details(product: &Product) {
    println!("{} ({})", product.title, product.id);
    println!("  category:    {}", product.category);
    println!("  unit:        {}", product.unit);
    println!("  price:       {} (was {})", product.price, product.origin_price);
    println!("  enabled:     {}", product.is_enabled);
    println!("  description: {}", product.description);
    println!("  content:     {}", product.content);
    if !product.image_url.is_empty() {
        println!("  image:       {}", product.image_url);
    }
    for url in &product.images_url {
        println!("  more:        {}", url);
    }
}

fn draft_from(matches: &ArgMatches) -> NewProductDraft {
    let text = |name: &str| matches.value_of(name).unwrap_or_default().to_string();
    NewProductDraft {
        title: text("title"),
        category: text("category"),
        unit: text("unit"),
        origin_price: text("origin-price"),
        price: text("price"),
        description: text("description"),
        content: text("content"),
        is_enabled: matches.is_present("enabled"),
        image_url: text("image-url"),
        images_url: Vec::new(),
    }
}

async fn require_session(admin: &CatalogAdmin) -> Result<Vec<Product>, Error> {
    admin
        .resume()
        .await?
        .ok_or_else(|| ApiError::NotAuthenticated.into())
}

async fn run(matches: &ArgMatches, prompt: Arc<TerminalPrompt>) -> Result<(), Error> {
    let config = AdminConfig::from_env()?;
    let state = matches.value_of("state").unwrap_or(".catalog-admin.json");
    let storage = Arc::new(FileStorage::open(state)?);
    let admin = CatalogAdmin::new(config, storage, prompt.clone())?;

    match matches.subcommand() {
        Some(("login", sub)) => {
            let username = sub.value_of("username").unwrap_or_default();
            let password = match sub.value_of("password") {
                Some(p) => p.to_string(),
                None => std::env::var("CATALOG_PASSWORD")
                    .map_err(|_| Error::config("pass --password or set CATALOG_PASSWORD"))?,
            };
            let products = admin
                .sign_in(&Credentials::new(username, &password))
                .await?;
            print_products(&products);
        }
        Some(("list", _)) => {
            let products = require_session(&admin).await?;
            print_products(&products);
        }
        Some(("show", sub)) => {
            require_session(&admin).await?;
            let id = sub.value_of("id").unwrap_or_default();
            match admin.catalog().product_details(id) {
                Some(product) => print_details(&product),
                None => prompt.notify(&format!("No product with id {}", id)).await,
            }
        }
        Some(("create", sub)) => {
            require_session(&admin).await?;
            let mut form = ProductForm::new();
            form.draft = draft_from(sub);
            form.open();
            form.submit(admin.catalog()).await?;
            prompt.notify("Product saved").await;
        }
        Some(("delete", sub)) => {
            require_session(&admin).await?;
            let id = sub.value_of("id").unwrap_or_default();
            if admin.catalog().delete_product(id).await? {
                prompt.notify("Deleted").await;
            }
        }
        Some(("status", _)) => match admin.session().restore_session().await {
            Some(session) => {
                let expires = session
                    .expires_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| session.expires_at_epoch_ms.to_string());
                println!("Signed in, session expires at {}", expires);
            }
            None => println!("Not signed in"),
        },
        Some(("logout", _)) => {
            admin.logout();
            println!("Signed out");
        }
        _ => unreachable!("clap enforces a subcommand"),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();

    let matches = cli().get_matches();
    let prompt = Arc::new(TerminalPrompt {
        assume_yes: matches.is_present("yes"),
    });

    if let Err(err) = run(&matches, prompt.clone()).await {
        log::debug!("command failed: {}", err);
        prompt.notify(&err.user_message()).await;
        process::exit(1);
    }
}
