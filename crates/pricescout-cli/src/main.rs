mod cache;
mod service;

use clap::{Parser, Subcommand};
use pricescout_core::{PriceOption, SellerAggregation};
use pricescout_scraper::SearchOutcome;
use tracing_subscriber::EnvFilter;

use crate::cache::{run_cache_command, CacheCommands};
use crate::service::PriceService;

#[derive(Debug, Parser)]
#[command(name = "pricescout")]
#[command(about = "Multi-source price lookup and seller discovery")]
struct Cli {
    /// Neither read nor write the cache for this invocation
    #[arg(long, global = true)]
    no_cache: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every source of a country for a product
    Search {
        query: String,
        /// ISO country code (e.g., IL)
        #[arg(long, default_value = "IL")]
        country: String,
        /// Maximum number of listings to return
        #[arg(long, default_value = "10")]
        max_results: usize,
    },
    /// Rank sellers by how many of the given products they carry
    Aggregate {
        #[arg(required = true)]
        queries: Vec<String>,
        #[arg(long, default_value = "IL")]
        country: String,
        /// Number of sellers to return
        #[arg(long, default_value = "5")]
        top: usize,
    },
    /// Extract a phone or WhatsApp number from a seller page
    Contact {
        url: String,
        #[arg(long, default_value = "IL")]
        country: String,
    },
    /// Show seller identity and contact for a seller page
    Seller {
        url: String,
        #[arg(long, default_value = "IL")]
        country: String,
    },
    /// Inspect and maintain the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = pricescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let sources = pricescout_core::load_sources(&config.sources_path)?;
    let service = PriceService::build(&config, &sources).await?;
    let bypass = cli.no_cache;

    match cli.command {
        Commands::Search {
            query,
            country,
            max_results,
        } => {
            let outcome = service.search(&query, &country, max_results, bypass).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&query, &outcome);
            }
        }
        Commands::Aggregate {
            queries,
            country,
            top,
        } => {
            let ranked = service
                .search_aggregated(&queries, &country, top, bypass)
                .await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                print_aggregations(&queries, &ranked);
            }
        }
        Commands::Contact { url, country } => {
            let contact = service.extract_contact_info(&url, &country, bypass).await;
            if cli.json {
                println!("{}", serde_json::json!({ "url": url, "contact": contact }));
            } else {
                match contact {
                    Some(number) => println!("{number}"),
                    None => println!("no contact found on {url}"),
                }
            }
        }
        Commands::Seller { url, country } => {
            let details = service.get_seller_details(&url, &country, bypass).await;
            match details {
                Some(details) if cli.json => println!("{}", serde_json::to_string_pretty(&details)?),
                Some(details) => {
                    println!("name:     {}", details.name);
                    println!("website:  {}", details.website_url.as_deref().unwrap_or("-"));
                    println!("contact:  {}", details.whatsapp_number.as_deref().unwrap_or("-"));
                    println!("country:  {}", details.country);
                }
                None => anyhow::bail!("could not load seller page {url}"),
            }
        }
        Commands::Cache { command } => run_cache_command(service.cache(), command, cli.json).await?,
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

fn print_listings(options: &[PriceOption]) {
    println!("{:>10}  {:<24}{:<8}URL", "PRICE", "SELLER", "SOURCE");
    for option in options {
        println!(
            "{:>10}  {:<24}{:<8}{}",
            format!("{} {}", option.price, option.currency),
            truncate(&option.seller.name, 22),
            option.seller.source_adapter,
            option.url
        );
    }
}

fn print_outcome(query: &str, outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Found(options) => {
            println!("{} listings for \"{query}\"", options.len());
            print_listings(options);
        }
        SearchOutcome::NoResults => println!("no listings found for \"{query}\""),
        SearchOutcome::Unavailable { failed_sources } => println!(
            "all sources unavailable ({}); try again later",
            failed_sources.join(", ")
        ),
    }
}

fn print_aggregations(queries: &[String], ranked: &[SellerAggregation]) {
    if ranked.is_empty() {
        println!("no seller carries any of the {} requested products", queries.len());
        return;
    }
    for (rank, seller) in ranked.iter().enumerate() {
        let rating = seller
            .average_rating
            .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
        println!(
            "{}. {} ({}/{} products, total {} ILS, rating {rating}, contact {})",
            rank + 1,
            seller.display_name,
            seller.product_count(),
            queries.len(),
            seller.total_price,
            seller.contact.as_deref().unwrap_or("-")
        );
        print_listings(&seller.products);
        println!();
    }
}

#[cfg(test)]
mod tests;
