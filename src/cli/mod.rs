pub mod command;

pub use command::PodCli;
