mod cli;

use anyhow::Result;
use beacon::mongo::{self, IndexOrder};
use beacon::{BeaconConfig, FeishuNotifier, consul_resolver};
use clap::Parser;
use cli::{Cli, Commands};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = BeaconConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    config.logging.init()?;
    let source = BeaconConfig::source_path(cli.config.as_deref());
    if source.exists() {
        info!("Loaded configuration from {:?}", source);
    } else {
        debug!("No config at {:?}, using defaults", source);
    }
    debug!("Using Consul at {}", config.consul.base_url());

    match cli.command {
        Commands::Register {
            service,
            port,
            tags,
        } => {
            println!(
                "register {} with port:{}, tags:[{}]",
                service,
                port,
                tags.join(", ")
            );
            let resolver = consul_resolver(&config)?;
            // Registration failures are reported, not fatal.
            match resolver
                .register(&service, port, tags.first().map(String::as_str))
                .await
            {
                Ok(record) => info!("Registered {}", record.service_id),
                Err(e) => eprintln!("{}", e),
            }
        }

        Commands::Unregister { service } => {
            println!("unregister {}", service);
            let resolver = consul_resolver(&config)?;
            match resolver.unregister(&service).await {
                Ok(removed) => info!("Removed {} instance(s)", removed),
                Err(e) => eprintln!("{}", e),
            }
        }

        Commands::GetAddress { service } => {
            let resolver = consul_resolver(&config)?;
            println!("{}", resolver.resolve_one(&service, None).await?);
        }

        Commands::Notify { text } => {
            let notifier = FeishuNotifier::from_config(&config.notify)?;
            notifier.deliver(&text).await?;
            info!("Notification sent");
        }

        Commands::Dedup {
            db,
            collection,
            field,
        } => {
            let report = mongo::deduplicate(&config.mongo.uri, &db, &collection, &field).await?;
            println!(
                "{} distinct, {} duplicated, {} removed",
                report.distinct, report.duplicated, report.deleted
            );
        }

        Commands::EnsureIndex {
            db,
            collection,
            fields,
            unique,
            descending,
        } => {
            let client = mongo::connect(&config.mongo.uri).await?;
            let collection = client.database(&db).collection(&collection);
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let order = if descending {
                IndexOrder::Descending
            } else {
                IndexOrder::Ascending
            };

            match mongo::ensure_index(&collection, &fields, unique, order).await? {
                Some(name) => println!("created index {}", name),
                None => println!("index on {} already exists", fields.join(",")),
            }
        }
    }

    Ok(())
}
