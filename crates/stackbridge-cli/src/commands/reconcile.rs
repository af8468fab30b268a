//! Reconcile command - one pass against the current kube context

use console::style;
use stackbridge_core::{ApiEndpoint, TenantCluster};
use stackbridge_kube::{KubeStore, ObjectKey, ObjectStore, OpenStackPlatform, OperationResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{CliError, Result};

pub struct ReconcileArgs<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub control_plane_namespace: &'a str,
    pub host: &'a str,
    pub port: i32,
}

fn describe(result: OperationResult) -> console::StyledObject<String> {
    let text = result.to_string();
    match result {
        OperationResult::Created => style(text).green(),
        OperationResult::Updated => style(text).yellow(),
        OperationResult::Unchanged => style(text).dim(),
    }
}

pub async fn run(args: ReconcileArgs<'_>) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling reconciliation");
            on_interrupt.cancel();
        }
    });

    let store = KubeStore::new().await?;

    let tenant: TenantCluster = store
        .get(&ObjectKey::new(args.namespace, args.name))
        .await?
        .ok_or_else(|| {
            CliError::cluster(format!(
                "TenantCluster '{}/{}' not found",
                args.namespace, args.name
            ))
        })?;

    // The provider image only matters for the deployment command
    let platform = OpenStackPlatform::default();
    let endpoint = ApiEndpoint::new(args.host, args.port);
    let mut failures = Vec::new();

    match platform
        .reconcile_infra_cr(&cancel, &store, &tenant, args.control_plane_namespace, &endpoint)
        .await
    {
        Ok((result, _)) => println!(
            "{} OpenStackCluster {}/{} {}",
            style("✓").green(),
            args.control_plane_namespace,
            args.name,
            describe(result)
        ),
        Err(err) => {
            println!("{} OpenStackCluster {}", style("✗").red(), style("failed").red());
            failures.push(StepError::new("infrastructure", err));
        }
    }

    match platform
        .reconcile_credentials(&cancel, &store, &tenant, args.control_plane_namespace)
        .await
    {
        Ok(report) => {
            println!(
                "{} cloud config secret {}",
                style("✓").green(),
                describe(report.cloud_config)
            );
            match report.ca_cert {
                Some(result) => println!(
                    "{} CA certificate secret {}",
                    style("✓").green(),
                    describe(result)
                ),
                None => println!(
                    "{} CA certificate secret {}",
                    style("-").dim(),
                    style("skipped (no cacert in credentials)").dim()
                ),
            }
        }
        Err(err) => {
            println!("{} credentials {}", style("✗").red(), style("failed").red());
            failures.push(StepError::new("credentials", err));
        }
    }

    if let Err(err) = platform
        .reconcile_secret_encryption(&cancel, &store, &tenant, args.control_plane_namespace)
        .await
    {
        failures.push(StepError::new("secret encryption", err));
    }

    join_failures(failures)
}

/// A failed reconcile step
#[derive(Debug)]
struct StepError {
    step: &'static str,
    error: CliError,
}

impl StepError {
    fn new(step: &'static str, error: impl Into<CliError>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }
}

/// Fold independent step failures into one error
///
/// A lone failure keeps its own exit code. An interrupt wins over
/// everything else.
fn join_failures(mut failures: Vec<StepError>) -> Result<()> {
    if failures.iter().any(|f| matches!(f.error, CliError::Interrupted)) {
        return Err(CliError::Interrupted);
    }
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0).error),
        count => {
            let details = failures
                .iter()
                .map(|f| format!("{}: {}", f.step, f.error))
                .collect::<Vec<_>>()
                .join("; ");
            Err(CliError::cluster(format!("{count} reconcile steps failed: {details}")))
        }
    }
}
