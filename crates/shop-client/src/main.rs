//! # shop
//!
//! Command-line storefront. Every invocation is a fresh process that restores
//! its session from the state file, the way a browser tab reloads.
//!
//! ```bash
//! shop login --email ada@example.com --password secret
//! shop checkout --item "Mug:8.50:2" --item "T-Shirt:19.99"
//! # ... pay in the browser, then feed the return URL back in:
//! shop resume "http://localhost:4200/home/cart?status=success"
//! ```

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use shop_client::{build_storefront, ClientConfig};
use shop_core::{
    dollars_to_cents, format_cents, Alert, Arrival, CartItem, DeliveryForm, NewUser,
    RedirectOutcome, Storefront, UserProfile,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "shop", about = "estore command-line storefront", version)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./shop.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json)
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account
    Signup(SignupArgs),
    /// Log in and start a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the session user
    Whoami,
    /// Pay for a cart on the provider's hosted page
    Checkout(CheckoutArgs),
    /// Handle the provider's return navigation (a URL or a query string)
    Resume {
        /// e.g. "http://localhost:4200/home/cart?status=success" or "status=cancel"
        target: String,
    },
}

#[derive(Debug, Args)]
struct SignupArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    pin: String,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Cart entry as NAME:PRICE[:QUANTITY], price in dollars
    #[arg(long = "item", value_parser = parse_item, required = true)]
    items: Vec<CartItem>,

    /// Delivery form overrides; unset fields come from the profile
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    pin: Option<String>,
}

fn parse_item(raw: &str) -> Result<CartItem, String> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err("item name is empty".to_string());
    }
    let price: f64 = parts
        .next()
        .ok_or("expected NAME:PRICE[:QUANTITY]")?
        .trim()
        .parse()
        .map_err(|e| format!("invalid price: {}", e))?;
    if !price.is_finite() || price < 0.0 {
        return Err(format!("invalid price: {}", price));
    }
    let quantity = match parts.next() {
        Some(q) => q
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid quantity: {}", e))?,
        None => 1,
    };
    if quantity == 0 {
        return Err("quantity must be at least 1".to_string());
    }

    let cents = price * 100.0;
    if cents >= i64::MAX as f64
        || dollars_to_cents(price)
            .checked_mul(i64::from(quantity))
            .is_none()
    {
        return Err(format!("price too large: {}", price));
    }

    let product_id = name.to_lowercase().replace(char::is_whitespace, "-");
    Ok(CartItem::new(product_id, name, dollars_to_cents(price), quantity))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is for the customer
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = ClientConfig::load(cli.config.as_deref()).context("loading configuration")?;
    debug!(?config, "Configuration loaded");

    let shop = build_storefront(&config).context("building storefront")?;
    shop.start();

    let ok = run(&shop, cli.command).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Run one command. Returns false when it ended in an error alert.
async fn run(shop: &Storefront, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Signup(args) => {
            let user = NewUser {
                profile: UserProfile {
                    first_name: args.first_name,
                    last_name: args.last_name,
                    address: args.address,
                    city: args.city,
                    state: args.state,
                    pin: args.pin,
                    email: args.email,
                },
                password: args.password,
            };
            if shop.signup(&user).await.is_ok() {
                debug!(email = %user.profile.email, "Account created");
            }
        }
        Command::Login { email, password } => {
            if let Ok(user) = shop.login(&email, &password).await {
                println!("Logged in as {}", user.email);
            }
        }
        Command::Logout => shop.logout(),
        Command::Whoami => {
            if !shop.session().is_authenticated() {
                println!("Not logged in");
                return Ok(false);
            }
            let user = shop.session().current_user();
            let name = user.full_name();
            println!("{}", if name.is_empty() { &user.email } else { &name });
            println!("  email:   {}", user.email);
            if let Some(expires_at) = shop.session().expires_at() {
                println!("  expires: {}", expires_at.to_rfc3339());
            }
        }
        Command::Checkout(args) => {
            for item in args.items {
                shop.add_to_cart(item);
            }
            let mut form = shop.view().form();
            override_field(&mut form.name, args.name);
            override_field(&mut form.address, args.address);
            override_field(&mut form.city, args.city);
            override_field(&mut form.state, args.state);
            override_field(&mut form.pin, args.pin);
            shop.set_form(form);

            let cart = shop.view().cart();
            println!(
                "Cart: {} item(s), total {}",
                cart.item_count(),
                format_cents(cart.total_cents())
            );
            if let Some(session) = shop.checkout().await {
                println!("Checkout session {} created", session.session_id);
            }
        }
        Command::Resume { target } => {
            let outcome = if target.contains("://") {
                RedirectOutcome::from_url(&target)
            } else {
                RedirectOutcome::from_query(&target)
            };
            if outcome == RedirectOutcome::None {
                bail!("no payment status in {:?}", target);
            }
            let state = shop.arrive(&Arrival::new(outcome)).await;
            debug!(?state, "Resolution finished");
            print_form(&shop.view().form());
        }
    }

    Ok(report(shop.view().alert()))
}

fn override_field(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn print_form(form: &DeliveryForm) {
    if form == &DeliveryForm::default() {
        return;
    }
    println!(
        "Deliver to: {}, {}, {}, {} {}",
        form.name, form.address, form.city, form.state, form.pin
    );
}

fn report(alert: Option<Alert>) -> bool {
    match alert {
        Some(alert) if alert.is_error() => {
            eprintln!("{}", alert);
            false
        }
        Some(alert) => {
            println!("{}", alert);
            true
        }
        None => true,
    }
}
