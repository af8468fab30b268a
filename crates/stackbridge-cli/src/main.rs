//! Stackbridge CLI - OpenStack Cluster API infrastructure for tenant clusters

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use commands::reconcile::ReconcileArgs;

/// Provider image used when neither the environment nor the tenant overrides it
const DEFAULT_PROVIDER_IMAGE: &str =
    "registry.k8s.io/capi-openstack/capi-openstack-controller:v0.11.2";

#[derive(Parser)]
#[command(name = "stackbridge")]
#[command(author = "Stackbridge Contributors")]
#[command(version)]
#[command(about = "Translate tenant clusters into OpenStack Cluster API infrastructure", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the OpenStackCluster a tenant cluster translates to
    Render {
        /// TenantCluster manifest
        file: PathBuf,

        /// Control plane endpoint host
        #[arg(long)]
        host: String,

        /// Control plane endpoint port
        #[arg(long, default_value_t = 6443)]
        port: i32,

        /// Namespace of the rendered resource (defaults to the tenant's)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Print the provider agent deployment spec
    Deployment {
        /// TenantCluster manifest
        file: PathBuf,

        /// Default provider image
        #[arg(long, default_value = DEFAULT_PROVIDER_IMAGE)]
        provider_image: String,

        /// Provider image override from the environment
        #[arg(long, env = stackbridge_core::PROVIDER_IMAGE_ENV_VAR, hide = true)]
        provider_image_override: Option<String>,
    },

    /// Reconcile one tenant cluster against the current kube context
    Reconcile {
        /// TenantCluster name
        name: String,

        /// TenantCluster namespace
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Namespace holding the tenant's control plane
        #[arg(long)]
        control_plane_namespace: String,

        /// Control plane endpoint host
        #[arg(long)]
        host: String,

        /// Control plane endpoint port
        #[arg(long, default_value_t = 6443)]
        port: i32,
    },

    /// Print the CustomResourceDefinitions
    Crds,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    match cli.command {
        Commands::Render {
            file,
            host,
            port,
            namespace,
        } => commands::render::run(&file, &host, port, namespace.as_deref()),

        Commands::Deployment {
            file,
            provider_image,
            provider_image_override,
        } => commands::deployment::run(&file, &provider_image, provider_image_override.as_deref()),

        Commands::Reconcile {
            name,
            namespace,
            control_plane_namespace,
            host,
            port,
        } => {
            commands::reconcile::run(ReconcileArgs {
                name: &name,
                namespace: &namespace,
                control_plane_namespace: &control_plane_namespace,
                host: &host,
                port,
            })
            .await
        }

        Commands::Crds => commands::crds::run(),
    }
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
