//! `storefront` command-line entry point.
//!
//! Replays a browse session against a JSON catalog file: opens the given
//! query string, optionally types a search, then scrolls through the
//! requested number of pages, printing each page as it lands.
//!
//! ```text
//! storefront --catalog products.json --query "category=jewelery&sort=desc" --pages 2
//! ```

#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use std::path::PathBuf;
use std::rc::Rc;
use storefront::filters::{AddressBar, MemoryAddressBar};
use storefront::observability::init_tracing;
use storefront::source::JsonFileCatalog;
use storefront::{Config, Result, Storefront, StorefrontError};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about = "Page through a product catalog with filters", long_about = None)]
struct Cli {
    /// JSON file holding an array of products
    #[arg(short, long)]
    catalog: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial query string, e.g. "category=jewelery&sort=desc&rating=4"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Search text typed after the first page loads
    #[arg(short, long)]
    search: Option<String>,

    /// Number of pages to load
    #[arg(short, long, default_value_t = 1)]
    pages: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run(cli, &config))
}

async fn run(cli: Cli, config: &Config) -> Result<()> {
    let source = Rc::new(JsonFileCatalog::new(cli.catalog));
    let mut store = Storefront::from_config(config, source, MemoryAddressBar::new(cli.query));

    store.open()?;
    store.settle().await?;

    if let Some(search) = cli.search.as_deref() {
        store.search_input(search)?;
        store.settle().await?;
    }

    let mut shown = print_new(&store, 0);
    for _ in 1..cli.pages {
        if !store.view().has_more || store.view().error.is_some() {
            break;
        }
        store.sentinel_visible()?;
        store.sentinel_hidden()?;
        store.settle().await?;
        shown = print_new(&store, shown);
    }

    if let Some(error) = store.view().error {
        return Err(StorefrontError::Catalog(error.clone()));
    }

    store.tick()?;
    println!("query: ?{}", store.address_bar().query_string());
    Ok(())
}

/// Prints items past `shown` and returns the new count.
fn print_new<A: AddressBar>(store: &Storefront<JsonFileCatalog, A>, shown: usize) -> usize {
    let view = store.view();
    if let Some(empty) = &view.empty_state {
        println!("{empty}");
    }
    if view.items.len() > shown {
        println!("-- items {}..{} --", shown + 1, view.items.len());
    }
    for item in &view.items[shown.min(view.items.len())..] {
        println!(
            "{:>5}  {:>9.2}  {:>3.1}*  {}",
            item.id, item.price, item.rating.rate, item.title
        );
    }
    view.items.len()
}
