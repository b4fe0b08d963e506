//! Tizaraa Storefront Cart CLI

use std::{io, process};

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use tizaraa::{
    cart::CartItemId,
    pricing::to_money,
    products::{SelectedVariants, VariantGroup},
    receipt::Receipt,
};
use tizaraa_app::{
    config::AppConfig,
    context::AppContext,
    domain::carts::{CartsService, CartsServiceError},
    observability,
};

#[derive(Debug, Parser)]
#[command(name = "tizaraa-app", about = "Tizaraa storefront cart", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the cart and its price breakdown
    Show,

    /// List the catalog
    Products,

    /// Add a product configuration to the cart
    Add(AddArgs),

    /// Set a cart line's quantity; 0 removes it
    Update {
        /// Cart line id
        item: String,

        /// New quantity
        quantity: u32,
    },

    /// Remove a cart line
    Remove {
        /// Cart line id
        item: String,
    },

    /// Move a cart line to the saved list
    Save {
        /// Cart line id
        item: String,
    },

    /// Move a saved item back into the cart
    Move {
        /// Saved item id
        item: String,
    },

    /// Remove a saved item
    Unsave {
        /// Saved item id
        item: String,
    },

    /// Manage promo codes
    Promo(PromoCommand),

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    product: String,

    /// Colour variant id
    #[arg(long)]
    color: String,

    /// Material variant id
    #[arg(long)]
    material: String,

    /// Size variant id
    #[arg(long)]
    size: String,

    /// Units to add
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct PromoCommand {
    #[command(subcommand)]
    command: PromoSubcommand,
}

#[derive(Debug, Subcommand)]
enum PromoSubcommand {
    /// Validate a code against the cart and activate it
    Apply {
        /// Promo code, any case
        code: String,
    },

    /// Deactivate a code
    Remove {
        /// Promo code, any case
        code: String,
    },
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = observability::init(&cli.config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let context = AppContext::new(&cli.config)
        .map_err(|error| format!("failed to start: {error}"))?;

    let carts = &context.carts;

    carts.load_from_storage().await.map_err(describe)?;

    match cli.command {
        Commands::Show => {}
        Commands::Products => {
            list_products(&context)?;

            return Ok(());
        }
        Commands::Add(args) => {
            carts
                .add_item(
                    &args.product,
                    SelectedVariants::new(args.color, args.material, args.size),
                    args.quantity,
                )
                .await
                .map_err(describe)?;
        }
        Commands::Update { item, quantity } => {
            carts
                .update_quantity(&CartItemId::from(item), quantity)
                .await
                .map_err(describe)?;
        }
        Commands::Remove { item } => {
            carts
                .remove_item(&CartItemId::from(item))
                .await
                .map_err(describe)?;
        }
        Commands::Save { item } => {
            carts
                .save_for_later(&CartItemId::from(item))
                .await
                .map_err(describe)?;
        }
        Commands::Move { item } => {
            carts
                .move_to_cart(&CartItemId::from(item))
                .await
                .map_err(describe)?;
        }
        Commands::Unsave { item } => {
            carts
                .remove_saved_item(&CartItemId::from(item))
                .await
                .map_err(describe)?;
        }
        Commands::Promo(PromoCommand {
            command: PromoSubcommand::Apply { code },
        }) => {
            let promo = carts
                .redeem_promo_code(&code, Timestamp::now())
                .await
                .map_err(describe)?;

            println!("applied {}: {}", promo.code, promo.description);
        }
        Commands::Promo(PromoCommand {
            command: PromoSubcommand::Remove { code },
        }) => {
            carts.remove_promo_code(&code).await.map_err(describe)?;
        }
        Commands::Clear => {
            carts.clear_cart().await.map_err(describe)?;
        }
    }

    print_cart(&context).await
}

async fn print_cart(context: &AppContext) -> Result<(), String> {
    let cart = context.carts.snapshot().await.map_err(describe)?;

    let breakdown = context
        .carts
        .summary(Timestamp::now())
        .await
        .map_err(describe)?;

    Receipt::new(&cart, breakdown, context.catalog.as_ref())
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to print receipt: {error}"))?;

    for (idx, item) in cart.items.iter().enumerate() {
        println!(" #{:<3} {}  {} x{}", idx + 1, item.id, item.product_id, item.quantity);
    }

    if !cart.saved_items.is_empty() {
        println!("\n Saved for later:");

        for item in &cart.saved_items {
            println!("   {}  {} x{}", item.id, item.product_id, item.quantity);
        }
    }

    Ok(())
}

fn list_products(context: &AppContext) -> Result<(), String> {
    for product in context.catalog.products() {
        let price = to_money(product.base_price).map_err(|error| error.to_string())?;

        println!("{}  {}  {price}", product.id, product.name);

        for group in VariantGroup::ALL {
            let options = product
                .variants
                .group(group)
                .iter()
                .map(|variant| format!("{} ({} left)", variant.id, variant.stock))
                .collect::<Vec<_>>()
                .join(", ");

            println!("    {:<10} {options}", group.field().to_string());
        }
    }

    Ok(())
}

fn describe(error: CartsServiceError) -> String {
    match &error {
        CartsServiceError::Persistence(source) => format!("{error}: {source}"),
        _ => error.to_string(),
    }
}
