use futures::{stream, TryStreamExt};
use k8s_openapi::{api::core::v1::Pod, apimachinery::pkg::apis::meta::v1::Status};
use kube::{
    api::{Api, AttachParams, AttachedProcess, ListParams},
    Client, ResourceExt,
};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{Error, ExecError};

/// Label selector for the pods of a deployment.
///
/// The name is not escaped: `a,tier=db` yields the two-term selector
/// `app=a,tier=db` and the API server interprets it as such.
pub fn deployment_selector(deployment: &str) -> String {
    format!("app={deployment}")
}

/// The one pod an invocation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
}

pub trait PodResolver {
    /// Returns the first pod matching `selector` in list order, or `None`.
    async fn resolve(&self, selector: &str) -> Result<Option<PodRef>, Error>;
}

pub trait PodExecutor {
    /// Runs `command` in the pod's default container and returns its combined output.
    async fn execute(&self, pod: &PodRef, command: &[String]) -> Result<String, ExecError>;
}

/// Resolver and executor backed by the pods API of one namespace.
pub struct KubePods {
    api: Api<Pod>,
    namespace: String,
}

impl KubePods {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }
}

impl PodResolver for KubePods {
    async fn resolve(&self, selector: &str) -> Result<Option<PodRef>, Error> {
        let lp = ListParams::default().labels(selector);
        let pods = self.api.list(&lp).await.map_err(|source| Error::List {
            namespace: self.namespace.clone(),
            selector: selector.to_string(),
            source,
        })?;
        debug!(selector, count = pods.items.len(), "listed pods");

        first_pod(pods, &self.namespace, selector)
    }
}

impl PodExecutor for KubePods {
    async fn execute(&self, pod: &PodRef, command: &[String]) -> Result<String, ExecError> {
        let ap = AttachParams {
            stdin: false,
            stdout: true,
            stderr: true,
            tty: false,
            container: None,
            ..Default::default()
        };
        let attached = self
            .api
            .exec(&pod.name, command.to_vec(), &ap)
            .await
            .map_err(|source| ExecError::Connect {
                pod: pod.name.clone(),
                source,
            })?;

        let output = drain(attached, &pod.name).await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

fn first_pod(
    pods: impl IntoIterator<Item = Pod>,
    namespace: &str,
    selector: &str,
) -> Result<Option<PodRef>, Error> {
    let Some(pod) = pods.into_iter().next() else {
        return Ok(None);
    };
    debug!(
        pod = %serde_json::to_string(&pod).unwrap_or_default(),
        "selected pod"
    );

    if pod.metadata.name.is_none() {
        return Err(Error::UnnamedPod {
            selector: selector.to_string(),
        });
    }
    Ok(Some(PodRef {
        name: pod.name_any(),
        namespace: pod.namespace().unwrap_or_else(|| namespace.to_string()),
    }))
}

async fn drain(mut attached: AttachedProcess, pod: &str) -> Result<Vec<u8>, ExecError> {
    let missing = |stream| ExecError::MissingStream {
        pod: pod.to_string(),
        stream,
    };
    let stdout = attached.stdout().ok_or_else(|| missing("stdout"))?;
    let stderr = attached.stderr().ok_or_else(|| missing("stderr"))?;
    let status = attached.take_status();

    let output = merge_output(stdout, stderr).await?;

    if let Some(status) = status {
        if let Some(status) = status.await {
            if let Some(message) = start_failure(&status) {
                return Err(ExecError::Start {
                    pod: pod.to_string(),
                    message,
                });
            }
        }
    }
    attached.join().await.map_err(|e| ExecError::Join(Box::new(e)))?;

    Ok(output)
}

/// Reads both streams to the end, appending chunks in the order they arrive.
async fn merge_output<O, E>(stdout: O, stderr: E) -> std::io::Result<Vec<u8>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    stream::select(ReaderStream::new(stdout), ReaderStream::new(stderr))
        .try_fold(Vec::new(), |mut buf, chunk| async move {
            buf.extend_from_slice(&chunk);
            Ok::<_, std::io::Error>(buf)
        })
        .await
}

/// Message of a status frame reporting that the command never ran.
fn start_failure(status: &Status) -> Option<String> {
    if status.status.as_deref() != Some("Failure") {
        return None;
    }
    if status.reason.as_deref() == Some("NonZeroExitCode") {
        debug!(message = status.message.as_deref().unwrap_or_default(), "remote command exited non-zero");
        return None;
    }
    Some(
        status
            .message
            .clone()
            .unwrap_or_else(|| "unknown exec failure".to_string()),
    )
}
