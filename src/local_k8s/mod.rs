pub mod client;
pub mod pods;

pub use client::incluster_client;
pub use pods::{deployment_selector, KubePods, PodExecutor, PodRef, PodResolver};
