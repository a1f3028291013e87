use hyper::Client as HyperClient;
use kube::{client::ConfigExt, Client, Config};
use tower::ServiceBuilder;
use tracing::debug;

use crate::error::Error;

/// Builds a client from the service account mounted into the pod.
///
/// There is no kubeconfig fallback: outside a cluster this fails with
/// [`Error::InCluster`] before any request is made.
pub fn incluster_client() -> Result<Client, Error> {
    let config = Config::incluster()?;
    debug!(cluster_url = %config.cluster_url, namespace = %config.default_namespace, "loaded in-cluster config");

    let https = config.rustls_https_connector().map_err(Error::ClientSetup)?;
    let auth = config.auth_layer().map_err(Error::ClientSetup)?;
    let service = ServiceBuilder::new()
        .layer(config.base_uri_layer())
        .option_layer(auth)
        .service(HyperClient::builder().build(https));

    Ok(Client::new(service, config.default_namespace))
}
