use std::ffi::OsString;

use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};

/// Parsed invocation: which deployment to target and what to run in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodCli {
    pub namespace: String,
    pub deployment: String,
    pub command: Vec<String>,
}

impl PodCli {
    /// Parses the process arguments, exiting with clap's usage error on failure.
    pub fn new() -> Self {
        match Self::try_parse_from(std::env::args_os()) {
            Ok(cli) => cli,
            Err(e) => e.exit(),
        }
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;

        let namespace = string_arg(&matches, "namespace");
        let deployment = string_arg(&matches, "deployment");
        let command = matches
            .get_many::<String>("command")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();

        Ok(Self {
            namespace,
            deployment,
            command,
        })
    }
}

// clap enforces `required` and fills `default_value`, so the fallback never applies
fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn command() -> Command {
    Command::new("kube-deploy-exec")
        .version(crate_version!())
        .about("Run a command in the first pod of a deployment, from inside the cluster")
        .arg(
            Arg::new("namespace")
                .short('n')
                .long("namespace")
                .default_value("default")
                .help("namespace the deployment lives in"),
        )
        .arg(
            Arg::new("deployment")
                .short('d')
                .long("deployment")
                .required(true)
                .help("deployment name, matched against the pod label app=<deployment>; must come before COMMAND"),
        )
        .arg(
            Arg::new("command")
                .required(true)
                .num_args(1..)
                .trailing_var_arg(true)
                .action(ArgAction::Append)
                .value_name("COMMAND")
                .help("command and arguments to run in the pod"),
        )
}
