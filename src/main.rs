mod cli;
mod error;
mod local_k8s;

use std::io::Write;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::PodCli;
use error::Error;
use local_k8s::{deployment_selector, incluster_client, KubePods, PodExecutor, PodRef, PodResolver};

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Executed { pod: PodRef, output: String },
    NotFound,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = PodCli::new();
    debug!(?args, "parsed arguments");

    let client = incluster_client().context("in-cluster authentication failed")?;
    let pods = KubePods::new(client, &args.namespace);

    let mut stdout = std::io::stdout().lock();
    // a missing pod is reported but still exits 0
    match run(&args, &pods, &pods, &mut stdout).await? {
        Outcome::Executed { pod, output } => {
            debug!(pod = %pod.name, bytes = output.len(), "exec finished")
        }
        Outcome::NotFound => debug!(deployment = %args.deployment, "no pod to exec into"),
    }

    Ok(())
}

/// Resolves the deployment to its first pod and runs the command there.
async fn run<R, E, W>(args: &PodCli, resolver: &R, executor: &E, out: &mut W) -> anyhow::Result<Outcome>
where
    R: PodResolver,
    E: PodExecutor,
    W: Write,
{
    let selector = deployment_selector(&args.deployment);
    info!(namespace = %args.namespace, %selector, "resolving pod");

    let Some(pod) = resolver.resolve(&selector).await? else {
        writeln!(out, "Pod not found.")?;
        return Ok(Outcome::NotFound);
    };

    writeln!(out, "Executing command in pod: {}", pod.name)?;
    let output = executor
        .execute(&pod, &args.command)
        .await
        .map_err(Error::from)
        .with_context(|| format!("exec in pod {}/{} failed", pod.namespace, pod.name))?;
    writeln!(out, "Command output: {output}")?;

    Ok(Outcome::Executed { pod, output })
}
