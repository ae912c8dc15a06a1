//! kafka-serde-discovery - Default Kafka serde discovery from the command line
//!
//! Reads an index manifest describing the application classes and the
//! application configuration, and prints the serializer and deserializer
//! defaults the build would add.
//!
//! # Usage
//!
//! ```bash
//! # Print generated defaults as properties
//! kafka-serde-discovery discover --index index.yaml --properties application.properties
//!
//! # Full report, including reflection registrations
//! kafka-serde-discovery discover --index index.yaml --format json
//!
//! # Explain how a single signature is classified
//! kafka-serde-discovery classify "Multi<Message<Price>>" --direction outgoing --index index.yaml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kafka_serde_discovery::{
    classify, ChannelDirection, ClassIndex, DefaultSerdeDiscovery, DiscoveryConfig, Imports,
    IndexManifest, Properties, SerdeResolver, ShapeKind, TypeSignature,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kafka-serde-discovery")]
#[command(version, about = "Default Kafka serde discovery for reactive messaging channels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate serde defaults for every Kafka channel
    Discover {
        /// Index manifest (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        index: PathBuf,
        /// Application configuration in .properties format
        #[arg(short, long)]
        properties: Option<PathBuf>,
        /// Discovery switches (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Skip default generation, only compute registrations
        #[arg(long)]
        no_autodetection: bool,
        /// Maximum number of reactive wrappers to peel (overrides the config file)
        #[arg(long)]
        max_depth: Option<usize>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Properties)]
        format: OutputFormat,
    },
    /// Classify one signature and resolve its serdes
    Classify {
        /// Java source signature, e.g. `Uni<Message<String>>`
        signature: String,
        /// Channel direction (incoming, outgoing)
        #[arg(short, long)]
        direction: ChannelDirection,
        /// Index manifest providing imports and application serdes
        #[arg(short, long)]
        index: Option<PathBuf>,
        /// Maximum number of reactive wrappers to peel
        #[arg(long, default_value_t = 4)]
        max_depth: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// `key=value` lines of the generated defaults
    Properties,
    /// Full report as JSON
    Json,
    /// Full report as YAML
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Discover {
            index,
            properties,
            config,
            no_autodetection,
            max_depth,
            format,
        } => {
            let overrides = Overrides {
                no_autodetection,
                max_depth,
            };
            discover(&index, properties.as_deref(), config.as_deref(), overrides, format)
        }
        Commands::Classify {
            signature,
            direction,
            index,
            max_depth,
        } => classify_signature(&signature, direction, index.as_deref(), max_depth),
    }
}

/// Command-line overrides of the discovery switches
struct Overrides {
    no_autodetection: bool,
    max_depth: Option<usize>,
}

impl Overrides {
    fn apply(&self, mut config: DiscoveryConfig) -> Result<DiscoveryConfig> {
        if self.no_autodetection {
            config = config.with_enabled(false);
        }
        if let Some(depth) = self.max_depth {
            config = config.with_max_wrapper_depth(depth);
        }
        config.validate().context("Invalid command-line overrides")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_manifest(path: &Path) -> Result<IndexManifest> {
    IndexManifest::load(path)
        .with_context(|| format!("Failed to load index manifest from {}", path.display()))
}

fn discover(
    index_path: &Path,
    properties: Option<&Path>,
    config: Option<&Path>,
    overrides: Overrides,
    format: OutputFormat,
) -> Result<()> {
    let manifest = load_manifest(index_path)?;
    let index = manifest
        .to_index()
        .with_context(|| format!("Invalid index manifest {}", index_path.display()))?;
    info!("Indexed {} class(es) from {}", index.len(), index_path.display());

    let props = match properties {
        Some(path) => Properties::load(path)
            .with_context(|| format!("Failed to load properties from {}", path.display()))?,
        None => Properties::new(),
    };
    let config = match config {
        Some(path) => DiscoveryConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DiscoveryConfig::default(),
    };
    let config = overrides.apply(config)?;
    debug!("Discovery config: {:?}", config);

    let report = DefaultSerdeDiscovery::with_config(&index, &props, config).run();

    match format {
        OutputFormat::Properties => print!("{}", report.to_properties()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }

    Ok(())
}

fn classify_signature(
    signature: &str,
    direction: ChannelDirection,
    index_path: Option<&Path>,
    max_depth: usize,
) -> Result<()> {
    let (imports, index) = match index_path {
        Some(path) => {
            let manifest = load_manifest(path)?;
            let index = manifest
                .to_index()
                .with_context(|| format!("Invalid index manifest {}", path.display()))?;
            (manifest.imports(), index)
        }
        None => (Imports::default(), ClassIndex::new()),
    };

    let parsed = TypeSignature::parse_with(signature, &imports)
        .with_context(|| format!("Invalid signature '{}'", signature))?;
    println!("Signature: {}", parsed);

    let Some(shape) = classify(&parsed, direction, max_depth) else {
        println!("No payload type: the channel gets no default");
        return Ok(());
    };

    match &shape.kind {
        ShapeKind::Value(_) => println!("Shape:     value ({} wrapper(s))", shape.wrapper_depth),
        ShapeKind::KeyValue { .. } => {
            println!("Shape:     key/value ({} wrapper(s))", shape.wrapper_depth)
        }
    }

    let role = direction.role();
    let resolver = SerdeResolver::new(&index);
    for (slot, payload) in shape.slots() {
        let resolved = resolver.resolve(payload, role);
        match resolved.serde_class(role) {
            Some(serde) => println!("{:<5}      {} -> {}", slot.to_string(), payload, serde),
            None => println!("{:<5}      {} -> (unresolved)", slot.to_string(), payload),
        }
        if resolved.uses_specific_avro_reader(role) {
            println!("           + apicurio.registry.use-specific-avro-reader=true");
        }
    }

    Ok(())
}
