//! NetBox IPAM command line
//!
//! Drives the provider lifecycle hooks from a shell. Every subcommand prints
//! its result as JSON on stdout; logs go to stderr.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use ipam_provider::{AvailableIpState, Provider, ProviderConfig, ProviderError};
use ipam_provider::config::{ENV_HOST, ENV_TIMEOUT_SECS, ENV_TLS_VERIFY, ENV_TOKEN};
use netbox_ipam::CancellationToken;
use serde::Serialize;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "netbox-ipam", version, about = "Reserve and manage IP addresses in NetBox IPAM")]
struct Cli {
    /// NetBox base URL, e.g. https://netbox.example.com [env: NETBOX_HOST]
    #[arg(long, global = true)]
    host: Option<String>,

    /// NetBox API token [env: NETBOX_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,

    /// Verify the server's TLS certificate, default true [env: NETBOX_TLS_VERIFY]
    #[arg(long, global = true)]
    tls_verify: Option<String>,

    /// Per-request timeout in seconds, default 10 [env: NETBOX_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout_secs: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find the prefix registered for a site and region
    LookupPrefix {
        #[arg(long)]
        site: String,
        #[arg(long)]
        region: String,
    },
    /// Reserve the next free address of a prefix
    Reserve {
        #[arg(long)]
        prefix_id: String,
        #[arg(long)]
        dns_name: String,
    },
    /// Show an address reservation
    Read {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        prefix_id: String,
    },
    /// Change the dns_name of a reservation
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        dns_name: String,
        /// Current address; read from NetBox when omitted
        #[arg(long)]
        address: Option<String>,
        #[arg(long, default_value = "")]
        prefix_id: String,
    },
    /// Release a reservation
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Adopt an existing address
    Import {
        #[arg(long)]
        id: String,
        #[arg(long)]
        prefix_id: String,
    },
}

#[derive(Serialize)]
struct Deleted<'a> {
    id: &'a str,
    deleted: bool,
}

impl Cli {
    /// Settings from `env`, with any flag given on the command line taking
    /// precedence over its variable
    fn provider_config<F>(&self, env: F) -> Result<ProviderConfig, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        ProviderConfig::from_lookup(|key| {
            let flag = match key {
                ENV_HOST => self.host.clone(),
                ENV_TOKEN => self.token.clone(),
                ENV_TLS_VERIFY => self.tls_verify.clone(),
                ENV_TIMEOUT_SECS => self.timeout_secs.clone(),
                _ => None,
            };
            flag.or_else(|| env(key))
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.provider_config(|key| env::var(key).ok())?;
    let provider = Provider::new(config.connect()?);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight request");
            on_signal.cancel();
        }
    });

    run(&provider, cli.command, &cancel).await
}

async fn run(provider: &Provider, command: Command, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::LookupPrefix { site, region } => {
            let prefix = provider.ipam_prefix().read(&site, &region, cancel).await?;
            print_json(&prefix)
        }
        Command::Reserve { prefix_id, dns_name } => {
            let state = provider.available_ip().create(&prefix_id, &dns_name, cancel).await?;
            print_json(&state)
        }
        Command::Read { id, prefix_id } => {
            let state = read_state(provider, &id, &prefix_id, cancel).await?;
            print_json(&state)
        }
        Command::Update {
            id,
            dns_name,
            address,
            prefix_id,
        } => {
            let current = match address {
                Some(ip_address) => AvailableIpState {
                    id,
                    prefix_id,
                    dns_name: String::new(),
                    ip_address,
                },
                None => read_state(provider, &id, &prefix_id, cancel).await?,
            };
            let state = provider.available_ip().update(&current, &dns_name, cancel).await?;
            print_json(&state)
        }
        Command::Delete { id } => {
            let state = AvailableIpState {
                id,
                prefix_id: String::new(),
                dns_name: String::new(),
                ip_address: String::new(),
            };
            provider.available_ip().delete(&state, cancel).await?;
            print_json(&Deleted {
                id: &state.id,
                deleted: true,
            })
        }
        Command::Import { id, prefix_id } => {
            let state = provider.available_ip().import(&id, &prefix_id, cancel).await?;
            info!("Import complete");
            print_json(&state)
        }
    }
}

async fn read_state(
    provider: &Provider,
    id: &str,
    prefix_id: &str,
    cancel: &CancellationToken,
) -> Result<AvailableIpState> {
    let probe = AvailableIpState {
        id: id.to_string(),
        prefix_id: prefix_id.to_string(),
        dns_name: String::new(),
        ip_address: String::new(),
    };
    match provider.available_ip().read(&probe, cancel).await? {
        Some(state) => Ok(state),
        None => bail!("IP address {} not found", id),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn update_accepts_optional_address() {
        let cli = Cli::try_parse_from([
            "netbox-ipam",
            "--host",
            "https://netbox.example.com",
            "--token",
            "abc",
            "update",
            "--id",
            "7",
            "--dns-name",
            "web-1.example.com",
        ])
        .unwrap();

        match cli.command {
            Command::Update { id, address, .. } => {
                assert_eq!(id, "7");
                assert!(address.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn lookup_from(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let pairs = pairs.to_vec();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["netbox-ipam"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["delete", "--id", "7"]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn settings_come_from_environment() {
        let cli = parse(&[]);

        let config = cli
            .provider_config(lookup_from(&[
                (ENV_HOST, "https://netbox.example.com"),
                (ENV_TOKEN, "abc"),
                (ENV_TLS_VERIFY, "False"),
                (ENV_TIMEOUT_SECS, "30"),
            ]))
            .unwrap();

        assert_eq!(config.host, "https://netbox.example.com");
        assert!(!config.tls_verify);
        assert_eq!(config.timeout, std::time::Duration::from_secs(30));
    }

    #[test]
    fn flags_override_environment() {
        let cli = parse(&[
            "--host",
            "https://other.example.com",
            "--tls-verify",
            "off",
            "--timeout-secs",
            "5",
        ]);

        let config = cli
            .provider_config(lookup_from(&[
                (ENV_HOST, "https://netbox.example.com"),
                (ENV_TOKEN, "abc"),
                (ENV_TLS_VERIFY, "true"),
            ]))
            .unwrap();

        assert_eq!(config.host, "https://other.example.com");
        assert_eq!(config.token, "abc");
        assert!(!config.tls_verify);
        assert_eq!(config.timeout, std::time::Duration::from_secs(5));
    }

    #[test]
    fn defaults_apply_without_optional_settings() {
        let cli = parse(&["--host", "https://netbox.example.com", "--token", "abc"]);

        let config = cli.provider_config(lookup_from(&[])).unwrap();
        assert!(config.tls_verify);
        assert_eq!(config.timeout, std::time::Duration::from_secs(10));
    }

    #[test]
    fn missing_token_and_bad_values_are_rejected() {
        let cli = parse(&["--host", "https://netbox.example.com"]);
        let err = cli.provider_config(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(ref msg) if msg.contains(ENV_TOKEN)));

        let cli = parse(&["--token", "abc", "--timeout-secs", "0"]);
        let err = cli
            .provider_config(lookup_from(&[(ENV_HOST, "https://netbox.example.com")]))
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));

        let cli = parse(&["--token", "abc", "--tls-verify", "maybe"]);
        let err = cli
            .provider_config(lookup_from(&[(ENV_HOST, "https://netbox.example.com")]))
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }
}
