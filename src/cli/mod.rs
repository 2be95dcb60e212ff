use clap::{Parser, Subcommand};
use std::path::PathBuf;

use beacon::BeaconConfig;

#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(about = "Register services with Consul and look up their addresses")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Consul agent host
    #[arg(long, env = "CONSUL_HOST", global = true)]
    pub consul_host: Option<String>,

    /// Consul agent HTTP port
    #[arg(long, env = "CONSUL_PORT", global = true)]
    pub consul_port: Option<u16>,

    /// MongoDB connection string
    #[arg(long, env = "MONGO_URI", global = true)]
    pub mongo_uri: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register service to consul
    Register {
        /// Service name, optionally `name:tag`
        service: String,

        /// Service port
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,

        /// Service tags (comma separated); the first one is used
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Unregister every instance of a service from the local agent
    Unregister {
        /// Service name; any `:tag` suffix is ignored
        service: String,
    },

    /// Get a service address
    #[command(name = "get_address")]
    GetAddress {
        /// Service name, optionally `name:tag`
        service: String,
    },

    /// Send a text message through the configured webhook
    Notify {
        /// Message text
        text: String,
    },

    /// Keep one document per distinct value of a field
    Dedup {
        /// Database name
        db: String,
        /// Collection name
        collection: String,
        /// Field to deduplicate on
        field: String,
    },

    /// Create an index unless one over the same fields exists
    #[command(name = "ensure_index")]
    EnsureIndex {
        db: String,
        collection: String,

        /// Index fields (comma separated); more than one makes a compound index
        #[arg(value_delimiter = ',', required = true)]
        fields: Vec<String>,

        #[arg(long)]
        unique: bool,

        /// Sort every key descending
        #[arg(long)]
        descending: bool,
    },
}

impl Cli {
    /// Fold command-line and environment overrides into the loaded config.
    pub fn apply_overrides(&self, config: &mut BeaconConfig) {
        if let Some(ref host) = self.consul_host {
            config.consul.host = host.clone();
        }
        if let Some(port) = self.consul_port {
            config.consul.port = port;
        }
        if let Some(ref uri) = self.mongo_uri {
            config.mongo.uri = uri.clone();
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn register_with_tags() {
        let cli =
            Cli::try_parse_from(["beacon", "register", "svc", "8080", "--tags", "v1,canary"])
                .unwrap();
        match cli.command {
            Commands::Register {
                service,
                port,
                tags,
            } => {
                assert_eq!(service, "svc");
                assert_eq!(port, 8080);
                assert_eq!(tags, vec!["v1".to_string(), "canary".to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn get_address_keeps_underscore_name() {
        let cli = Cli::try_parse_from(["beacon", "get_address", "offer-api:v2"]).unwrap();
        assert!(matches!(cli.command, Commands::GetAddress { ref service } if service == "offer-api:v2"));
    }

    #[test]
    fn register_rejects_port_zero_and_overflow() {
        assert!(Cli::try_parse_from(["beacon", "register", "svc", "0"]).is_err());
        assert!(Cli::try_parse_from(["beacon", "register", "svc", "70000"]).is_err());
    }

    #[test]
    fn ensure_index_takes_compound_fields() {
        let cli = Cli::try_parse_from([
            "beacon",
            "ensure_index",
            "source_data",
            "pdd_url",
            "tag,url",
            "--unique",
        ])
        .unwrap();
        match cli.command {
            Commands::EnsureIndex {
                db,
                collection,
                fields,
                unique,
                descending,
            } => {
                assert_eq!(db, "source_data");
                assert_eq!(collection, "pdd_url");
                assert_eq!(fields, vec!["tag".to_string(), "url".to_string()]);
                assert!(unique);
                assert!(!descending);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn mongo_uri_overrides_config() {
        let cli = Cli::try_parse_from([
            "beacon",
            "--mongo-uri",
            "mongodb://db.internal:27017",
            "dedup",
            "picSearch",
            "pdd",
            "url",
        ])
        .unwrap();

        let mut config = BeaconConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.mongo.uri, "mongodb://db.internal:27017");
        assert!(matches!(cli.command, Commands::Dedup { ref field, .. } if field == "url"));
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let cli = Cli::try_parse_from([
            "beacon",
            "--consul-host",
            "consul.internal",
            "--consul-port",
            "8501",
            "-v",
            "unregister",
            "svc",
        ])
        .unwrap();

        let mut config = BeaconConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.consul.host, "consul.internal");
        assert_eq!(config.consul.port, 8501);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }
}
