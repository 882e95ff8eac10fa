use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    CarouselController, CarouselEvent, FieldUpdate, OrderFormController, OrderFormEvent,
    RelayDispatcher, SubmitOutcome,
};
use shared::{catalog::Catalog, domain::ContactMethod, locale::Locale};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    #[arg(long, default_value_t = Locale::DEFAULT)]
    locale: Locale,
    /// Local fallback log of submitted orders.
    #[arg(long, default_value = "sqlite://./data/storefront.db")]
    database_url: String,
    /// Catalog JSON file; the built-in catalog is used when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Show {
        slug: String,
        #[arg(long)]
        image: Option<usize>,
        /// Advance the carousel this many times (negative goes backwards).
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        step: i32,
    },
    Order {
        slug: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = ContactMethod::Line)]
        method: ContactMethod,
        #[arg(long)]
        contact: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long, default_value = "")]
        customization: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let catalog = Arc::new(match &args.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin()?,
    });

    match args.command {
        Command::List => {
            for view in catalog.views(args.locale) {
                println!(
                    "{:>3}  {:<20} {}  [{}]",
                    view.id, view.slug, view.title, view.category
                );
            }
        }
        Command::Show { slug, image, step } => {
            let project = catalog
                .by_slug(&slug)
                .with_context(|| format!("no project with slug '{slug}'"))?;
            let view = project.localized(args.locale);
            println!("{}", view.title);
            println!("  {}", view.category);
            println!("  {}", view.materials);
            println!("  {}", view.time_spent);
            println!("  {}", view.description);
            if !view.color_palette.is_empty() {
                println!("  {}", view.color_palette.join(" "));
            }

            let mut carousel = CarouselController::new(Arc::clone(&catalog));
            let mut events = carousel.subscribe();
            carousel.open(project.id)?;
            if let Some(index) = image {
                carousel.select_image(index)?;
            }
            for _ in 0..step.unsigned_abs() {
                if step > 0 {
                    carousel.next();
                } else {
                    carousel.prev();
                }
            }
            print_carousel_events(&mut events);
            match (carousel.current_index(), carousel.current_image()) {
                (Some(index), Some(path)) => {
                    println!("image {}/{}: {path}", index + 1, project.image_count())
                }
                _ => println!("no images"),
            }
            carousel.close();
        }
        Command::Order {
            slug,
            name,
            method,
            contact,
            quantity,
            customization,
        } => {
            let project = catalog
                .by_slug(&slug)
                .with_context(|| format!("no project with slug '{slug}'"))?;
            let storage = Storage::new(&args.database_url)
                .await
                .inspect_err(|error| {
                    warn!(%error, database_url = %args.database_url, "fallback log unavailable")
                })
                .with_context(|| format!("failed to open fallback log '{}'", args.database_url))?;
            let dispatcher = RelayDispatcher::new(&args.server_url)?;

            let form = OrderFormController::open(
                &catalog,
                project.id,
                args.locale,
                Arc::new(dispatcher),
                Arc::new(storage),
            )?;
            let mut events = form.subscribe();
            form.update_field(FieldUpdate::Name(name))?;
            form.update_field(FieldUpdate::ContactMethod(method))?;
            form.update_field(FieldUpdate::Contact(contact))?;
            form.update_field(FieldUpdate::Quantity(quantity))?;
            form.update_field(FieldUpdate::Customization(customization))?;

            info!(project_id = %project.id, server_url = %args.server_url, "submitting order");
            let outcome = form.submit().await?;
            print_form_events(&mut events);
            match outcome {
                SubmitOutcome::Delivered(submission) => println!(
                    "order sent: {} x{} for {}",
                    submission.project_title, submission.quantity, submission.name
                ),
                SubmitOutcome::Invalid(errors) => {
                    for error in errors {
                        println!("{:?}: {}", error.field, error.kind.message_key());
                    }
                    std::process::exit(2);
                }
                SubmitOutcome::Failed => {
                    println!("{}", client_core::SUBMIT_ERROR_KEY);
                    std::process::exit(1);
                }
                SubmitOutcome::Discarded => warn!("order form closed before the result arrived"),
            }
            form.close();
        }
    }

    Ok(())
}

fn print_carousel_events(events: &mut broadcast::Receiver<CarouselEvent>) {
    while let Ok(event) = events.try_recv() {
        println!("  > {event:?}");
    }
}

fn print_form_events(events: &mut broadcast::Receiver<OrderFormEvent>) {
    while let Ok(event) = events.try_recv() {
        println!("  > {event:?}");
    }
}
