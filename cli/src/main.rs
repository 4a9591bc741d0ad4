mod commands;
mod config;
mod logging;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_list_add, cmd_list_remove, cmd_list_show, cmd_product_add, cmd_product_delete,
    cmd_product_list, cmd_product_show, cmd_product_stock, cmd_recent, cmd_recipe_add,
    cmd_recipe_delete, cmd_recipe_list, cmd_recipe_show, cmd_search, cmd_seed, cmd_store_add,
    cmd_store_delete, cmd_store_list, cmd_suggest,
};
use crate::config::Config;
use larder_core::PlannerService;
use larder_core::shopping::RECENT_ITEMS_PAGE;

#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "A household meal planner and shopping list",
    long_about = "Tracks stores, products and recipes, keeps a shopping list, and \
                  suggests what to eat for the current meal without repeating \
                  anything from the past week."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a recipe for the current meal
    Suggest {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage stores
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the shopping list
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Show recently used products, most recent first
    Recent {
        /// Number of items to show
        #[arg(short, long, default_value_t = RECENT_ITEMS_PAGE)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search products, grouped by shopping-list status
    Search {
        /// Name fragment (case-insensitive)
        term: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a sample household into an empty database
    Seed {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// Add a store
    Add {
        /// Store name
        name: String,
        /// Map link
        #[arg(long)]
        maps_url: Option<String>,
        /// Photo URL
        #[arg(long)]
        photo: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stores
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a store (products are kept)
    Delete {
        /// Store ID or name
        store: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// Add a product
    Add {
        /// Product name
        name: String,
        /// Usual quantity
        #[arg(short, long)]
        quantity: Option<f64>,
        /// Unit for the quantity (g, kg, ml, units, ...)
        #[arg(short, long)]
        unit: Option<String>,
        /// Store ID or name where it is bought (repeatable)
        #[arg(short, long = "store")]
        stores: Vec<String>,
        /// Mark as in stock
        #[arg(long)]
        in_stock: bool,
        /// Photo URL
        #[arg(long)]
        photo: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List products
    List {
        /// Name fragment to filter by
        #[arg(short, long)]
        search: Option<String>,
        /// Only products sold at this store (repeatable, matches any)
        #[arg(long = "store")]
        stores: Vec<String>,
        /// Only products in stock
        #[arg(long, conflicts_with = "out_of_stock")]
        in_stock: bool,
        /// Only products out of stock
        #[arg(long)]
        out_of_stock: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show product details
    Show {
        /// Product ID or name
        product: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a product in stock (or out of stock with --out)
    Stock {
        /// Product ID or name
        product: String,
        /// Mark as out of stock instead
        #[arg(long)]
        out: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a product (also drops it from the list, recent items and recipes)
    Delete {
        /// Product ID or name
        product: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Add a recipe
    Add {
        /// Recipe name
        name: String,
        /// Meal: breakfast, lunch, dinner
        #[arg(short, long)]
        meal: String,
        /// Preparation time in minutes
        #[arg(long, default_value_t = 0)]
        prep: u32,
        /// Cooking time in minutes
        #[arg(long, default_value_t = 0)]
        cook: u32,
        /// Ingredient as "product:quantity unit", e.g. "Eggs:3 units" (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
        /// Photo URL
        #[arg(long)]
        photo: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes
    List {
        /// Name fragment to filter by
        #[arg(short, long)]
        search: Option<String>,
        /// Only recipes for this meal: breakfast, lunch, dinner
        #[arg(short, long)]
        meal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recipe details with ingredient stock
    Show {
        /// Recipe ID or name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe and its suggestion history
    Delete {
        /// Recipe ID or name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Add a product to the shopping list (no-op if already there)
    Add {
        /// Product ID or name
        product: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a product from the shopping list
    Remove {
        /// Product ID or name
        product: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the shopping list and recently used products
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut service = PlannerService::new(&config.db_path)?;
    tracing::debug!(db = %config.db_path.display(), "opened database");

    match cli.command {
        Commands::Suggest { json } => cmd_suggest(&mut service, json),
        Commands::Store { command } => match command {
            StoreCommands::Add {
                name,
                maps_url,
                photo,
                notes,
                json,
            } => cmd_store_add(service.db(), &name, maps_url, photo, notes, json),
            StoreCommands::List { json } => cmd_store_list(service.db(), json),
            StoreCommands::Delete { store, json } => cmd_store_delete(service.db(), &store, json),
        },
        Commands::Product { command } => match command {
            ProductCommands::Add {
                name,
                quantity,
                unit,
                stores,
                in_stock,
                photo,
                notes,
                json,
            } => cmd_product_add(
                service.db(),
                &name,
                quantity,
                unit,
                &stores,
                in_stock,
                photo,
                notes,
                json,
            ),
            ProductCommands::List {
                search,
                stores,
                in_stock,
                out_of_stock,
                json,
            } => {
                let stock = match (in_stock, out_of_stock) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                cmd_product_list(service.db(), search, &stores, stock, json)
            }
            ProductCommands::Show { product, json } => {
                cmd_product_show(service.db(), &product, json)
            }
            ProductCommands::Stock { product, out, json } => {
                cmd_product_stock(service.db(), &product, !out, json)
            }
            ProductCommands::Delete { product, json } => {
                cmd_product_delete(service.db(), &product, json)
            }
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::Add {
                name,
                meal,
                prep,
                cook,
                ingredients,
                photo,
                notes,
                json,
            } => cmd_recipe_add(
                service.db(),
                &name,
                &meal,
                prep,
                cook,
                &ingredients,
                photo,
                notes,
                json,
            ),
            RecipeCommands::List { search, meal, json } => {
                cmd_recipe_list(service.db(), search, meal.as_deref(), json)
            }
            RecipeCommands::Show { recipe, json } => cmd_recipe_show(service.db(), &recipe, json),
            RecipeCommands::Delete { recipe, json } => {
                cmd_recipe_delete(service.db(), &recipe, json)
            }
        },
        Commands::List { command } => match command {
            ListCommands::Add { product, json } => cmd_list_add(&service, &product, json),
            ListCommands::Remove { product, json } => cmd_list_remove(&service, &product, json),
            ListCommands::Show { json } => cmd_list_show(&service, json),
        },
        Commands::Recent { limit, json } => cmd_recent(&service, limit, json),
        Commands::Search { term, json } => cmd_search(&service, &term, json),
        Commands::Seed { json } => cmd_seed(&service, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(service, port, &bind, api_key, new_api_key).await
        }
    }
}
