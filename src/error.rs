use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load in-cluster config: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("failed to build kube client: {0}")]
    ClientSetup(#[source] kube::Error),

    #[error("failed to list pods in namespace {namespace} with selector {selector}: {source}")]
    List {
        namespace: String,
        selector: String,
        #[source]
        source: kube::Error,
    },

    #[error("pod matching {selector} has no name")]
    UnnamedPod { selector: String },

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Failures of the exec call itself. A remote command exiting non-zero is not one of them.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to open exec stream to pod {pod}: {source}")]
    Connect {
        pod: String,
        #[source]
        source: kube::Error,
    },

    #[error("exec stream for pod {pod} has no {stream}")]
    MissingStream { pod: String, stream: &'static str },

    #[error("failed to read exec output: {0}")]
    Read(#[from] std::io::Error),

    #[error("command failed to start in pod {pod}: {message}")]
    Start { pod: String, message: String },

    #[error("exec stream terminated abnormally: {0}")]
    Join(#[source] Box<dyn std::error::Error + Send + Sync>),
}
