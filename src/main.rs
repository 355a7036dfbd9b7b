//! sbom-merge: merge and rewrite container SBOMs
//!
//! Merges resolver (Cachi2) and scanner (Syft) SBOMs, records base images,
//! injects image references and grafts parent image SBOMs for `CycloneDX`
//! and SPDX documents.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sbom_merge::{
    cli::{self, BaseImagesArgs, ConfigAction, ContextualizeArgs},
    config::{load_or_default, AppConfig},
    merge::Flavour,
    model::SbomFormat,
    pipeline::exit_codes,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sbom-merge")]
#[command(version)]
#[command(about = "Merge and rewrite container SBOMs", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    3  Error occurred

EXAMPLES:
    # Merge a Cachi2 SBOM with two Syft SBOMs
    sbom-merge merge cachi2:cachi2.json syft:source.json syft:image.json -O sbom.json

    # Record base images in an SBOM
    sbom-merge base-images --sbom sbom.json --digests base-images-digests.txt

    # Make the built image the subject of its SBOM
    sbom-merge image-ref --sbom sbom.json --image-url quay.io/ns/app:v1 --image-digest sha256:...")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output flags shared by document-producing commands
#[derive(clap::Args)]
struct OutputArgs {
    /// Write the document to a file instead of stdout
    #[arg(short = 'O', long = "output-file")]
    output_file: Option<PathBuf>,

    /// JSON indentation (0 for compact output)
    #[arg(long)]
    indent: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge resolver and scanner SBOMs
    Merge {
        /// Inputs as `[cachi2|syft:]PATH`
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<String>,

        /// Require every input to be in this format
        #[arg(long, value_enum)]
        format: Option<SbomFormat>,

        /// Flavour of the first input when it has no prefix
        #[arg(long)]
        first_flavour: Option<Flavour>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Record the base images of a multi-stage build in an SBOM
    BaseImages {
        #[arg(long)]
        sbom: PathBuf,

        /// File with `repository:tag@digest` per line
        #[arg(long)]
        digests: PathBuf,

        /// File with the `FROM` images, one per line
        #[arg(long, conflicts_with = "parsed_dockerfile")]
        dockerfile_images: Option<PathBuf>,

        /// `dockerfile-json` output of the build's Dockerfile
        #[arg(long)]
        parsed_dockerfile: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Make the built image the subject of an SBOM
    ImageRef {
        #[arg(long)]
        sbom: PathBuf,

        /// Image repository with tag, e.g. `quay.io/ns/app:v1`
        #[arg(long)]
        image_url: String,

        /// Image digest, e.g. `sha256:...`
        #[arg(long)]
        image_digest: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Graft a parent image SBOM under a component SBOM
    Contextualize {
        #[arg(long)]
        component: PathBuf,

        #[arg(long)]
        parent: PathBuf,

        /// Platform of the parent image, e.g. `linux/arm64`
        #[arg(long)]
        platform: Option<String>,

        /// `dockerfile-json` output naming the parent image
        #[arg(long)]
        parsed_dockerfile: Option<PathBuf>,

        /// Build target stage
        #[arg(long, requires = "parsed_dockerfile")]
        target_stage: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the purls of an SBOM
    Purls {
        #[arg(long)]
        sbom: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show configuration, its JSON Schema, or an example file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration (defaults, file, CLI)
    Show,
    /// Print the JSON Schema of the config file format
    Schema,
    /// Print an example config file
    Example,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            exit_codes::ERROR
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let (mut config, loaded_from) = load_or_default(cli.config.as_deref());
    if let Some(path) = &loaded_from {
        tracing::debug!("Loaded config from {}", path.display());
    }

    match cli.command {
        Commands::Merge {
            inputs,
            format,
            first_flavour,
            output,
        } => {
            let mut overrides = output_overrides(&output);
            overrides.merge.format = format;
            if let Some(flavour) = first_flavour {
                overrides.merge.default_first_flavour = flavour;
            }
            config.merge(&overrides);
            cli::run_merge(&inputs, &config)
        }

        Commands::BaseImages {
            sbom,
            digests,
            dockerfile_images,
            parsed_dockerfile,
            output,
        } => {
            config.merge(&output_overrides(&output));
            let args = BaseImagesArgs {
                sbom,
                digests,
                dockerfile_images,
                parsed_dockerfile,
            };
            cli::run_base_images(&args, &config)
        }

        Commands::ImageRef {
            sbom,
            image_url,
            image_digest,
            output,
        } => {
            config.merge(&output_overrides(&output));
            cli::run_image_ref(&sbom, &image_url, &image_digest, &config)
        }

        Commands::Contextualize {
            component,
            parent,
            platform,
            parsed_dockerfile,
            target_stage,
            output,
        } => {
            let mut overrides = output_overrides(&output);
            overrides.provenance.platform = platform;
            config.merge(&overrides);
            let args = ContextualizeArgs {
                component,
                parent,
                parsed_dockerfile,
                target_stage,
            };
            cli::run_contextualize(&args, &config)
        }

        Commands::Purls { sbom, output } => {
            config.merge(&output_overrides(&output));
            cli::run_purls(&sbom, &config)
        }

        Commands::Config { action } => {
            let action = match action {
                ConfigCommand::Show => ConfigAction::Show,
                ConfigCommand::Schema => ConfigAction::Schema,
                ConfigCommand::Example => ConfigAction::Example,
            };
            cli::run_config(action, &config, loaded_from.as_deref())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sbom-merge", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// CLI output flags as a config layer over file settings.
fn output_overrides(output: &OutputArgs) -> AppConfig {
    let mut builder = AppConfig::builder().output_file(output.output_file.clone());
    if let Some(indent) = output.indent {
        builder = builder.indent(indent);
    }
    builder.build()
}
