use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{catalog::Catalog, locale::Locale};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/storefront.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the local fallback order log.
    ListOrders,
    /// Dump the fallback order log as a JSON array.
    ExportOrders {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    ClearOrders,
    /// Validate a catalog file, or the built-in catalog when no path is given.
    CheckCatalog {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::ListOrders => {
            let storage = Storage::new(&cli.database_url).await?;
            let orders = storage.load_orders().await?;
            if orders.is_empty() {
                println!("no recorded orders");
            }
            for (index, order) in orders.iter().enumerate() {
                println!(
                    "#{} {} project={} \"{}\" {} via {}={} qty={}",
                    index + 1,
                    order.timestamp.to_rfc3339(),
                    order.project_id,
                    order.project_title,
                    order.name,
                    order.contact_method,
                    order.contact,
                    order.quantity
                );
            }
        }
        Command::ExportOrders { output } => {
            let storage = Storage::new(&cli.database_url).await?;
            let orders = storage.load_orders().await?;
            let json = serde_json::to_string_pretty(&orders)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("exported {} orders to {}", orders.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::ClearOrders => {
            let storage = Storage::new(&cli.database_url).await?;
            let removed = storage.clear_orders().await?;
            println!("removed {removed} orders");
        }
        Command::CheckCatalog { path } => {
            let catalog = match path {
                Some(path) => Catalog::from_path(path)?,
                None => Catalog::builtin()?,
            };
            println!("catalog ok: {} projects", catalog.len());
            for project in catalog.all() {
                let translated: Vec<Locale> = project.title.locales().collect();
                let missing: Vec<&str> = Locale::ALL
                    .into_iter()
                    .filter(|locale| !translated.contains(locale))
                    .map(Locale::code)
                    .collect();
                println!(
                    "  {:>3} {:<20} images={} untranslated_title={}",
                    project.id,
                    project.slug,
                    project.image_count(),
                    if missing.is_empty() {
                        "-".to_string()
                    } else {
                        missing.join(",")
                    }
                );
            }
        }
    }

    Ok(())
}
