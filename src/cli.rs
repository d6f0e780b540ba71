//! Command-line front end for the `sanction-client` binary.
//!
//! Logs go to stderr; stdout only ever carries the pretty-printed JSON result.

// std
use std::{process::ExitCode, time::Duration as StdDuration};
// crates.io
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Serializer, Value, json, ser::PrettyFormatter};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{
	_prelude::*,
	api::{ApiClient, SanctionQuery},
	config::Config,
	flows::{Broker, TokenRequest},
	http::{HttpOptions, ReqwestHttpClient},
	store::{FileStore, MemoryStore, TokenStore},
};

/// Result type used by the command-line layer.
pub type CliResult<T> = color_eyre::Result<T>;

/// Where the access token is cached between calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CacheKind {
	/// Process memory; every invocation fetches a fresh token.
	Memory,
	/// JSON file shared across invocations.
	#[default]
	File,
}

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "sanction-client", version, about)]
pub struct Cli {
	/// Token cache backend.
	#[arg(long, global = true, value_enum, default_value_t = CacheKind::File)]
	pub cache: CacheKind,
	/// Cache file location; overrides `CIPHEROWL_TOKEN_PATH`.
	#[arg(long, global = true)]
	pub cache_path: Option<PathBuf>,
	/// Ignore the cached token and fetch a new one.
	#[arg(long, global = true)]
	pub force_refresh: bool,
	/// Seconds before expiry at which a cached token is already considered stale.
	#[arg(long, global = true, default_value_t = 0)]
	pub expiry_leeway: u32,
	/// HTTP timeout in seconds.
	#[arg(long, global = true, default_value_t = 30)]
	pub timeout: u64,
	/// Log at debug level unless `RUST_LOG` says otherwise.
	#[arg(short, long, global = true)]
	pub verbose: bool,
	/// Emit logs as JSON lines.
	#[arg(long, global = true)]
	pub log_json: bool,
	/// Operation to run.
	#[command(subcommand)]
	pub command: Command,
}
impl Cli {
	fn token_request(&self) -> TokenRequest {
		TokenRequest::new()
			.with_force(self.force_refresh)
			.with_expiry_leeway(Duration::seconds(self.expiry_leeway.into()))
	}

	fn http_options(&self) -> HttpOptions {
		HttpOptions { timeout: Some(StdDuration::from_secs(self.timeout)), ..Default::default() }
	}
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
	/// Screen an address against sanction lists.
	Sanction {
		/// Project the lookup is billed to.
		#[arg(long, default_value = SanctionQuery::DEFAULT_PROJECT)]
		project: String,
		/// Chain identifier.
		#[arg(long, default_value = SanctionQuery::DEFAULT_CHAIN)]
		chain: String,
		/// Address to screen.
		#[arg(long, default_value = SanctionQuery::DEFAULT_ADDRESS)]
		address: String,
	},
	/// GET an arbitrary path below the API base.
	Get {
		/// Path such as `/api/v1/risk`.
		path: String,
		/// Query parameter as `key=value`; repeatable.
		#[arg(long = "query", short = 'q', value_parser = parse_key_value)]
		query: Vec<(String, String)>,
	},
	/// Show when the current token expires.
	Token,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` with `verbose`.
pub fn init_tracing(verbose: bool, json: bool) -> CliResult<()> {
	let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
		Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
		_ => EnvFilter::new(if verbose { "debug" } else { "info" }),
	};
	let registry = tracing_subscriber::registry();

	if json {
		let fmt = tracing_subscriber::fmt::layer()
			.json()
			.with_writer(std::io::stderr)
			.with_filter(filter);

		registry.with(fmt).try_init()?;
	} else {
		let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(filter);

		registry.with(fmt).try_init()?;
	}

	Ok(())
}

/// Executes the parsed command and returns the JSON document to print.
pub async fn run(cli: Cli, config: Config) -> CliResult<Value> {
	let http_client = Arc::new(ReqwestHttpClient::new(&cli.http_options())?);
	let store: Arc<dyn TokenStore> = match cli.cache {
		CacheKind::Memory => Arc::new(MemoryStore::default()),
		CacheKind::File => {
			let path = match &cli.cache_path {
				Some(path) => path.clone(),
				None => config.token_path()?,
			};

			tracing::debug!(path = %path.display(), "using file token cache");

			Arc::new(FileStore::new(path))
		},
	};

	let descriptor = config.descriptor()?;
	let api = ApiClient::new(http_client.clone(), descriptor.endpoints.api_base.clone());
	let broker = Broker::with_http_client(
		store,
		descriptor,
		config.client_id.as_str(),
		config.client_secret.as_str(),
		http_client,
	);
	let request = cli.token_request();
	let output = match cli.command {
		Command::Sanction { project, chain, address } => {
			let bearer = broker.access_token(request).await?;

			api.sanction(&SanctionQuery::new(project, chain, address), &bearer).await?
		},
		Command::Get { path, query } => {
			let bearer = broker.access_token(request).await?;

			api.get(&path, &query, &bearer).await?
		},
		Command::Token => token_summary(&broker.client_credentials(request).await?)?,
	};

	Ok(output)
}

/// Binary entry point: loads `.env`, installs reporting, and runs the parsed command.
pub fn main() -> ExitCode {
	// A missing `.env` is not an error.
	let _ = dotenvy::dotenv();
	let cli = Cli::parse();

	if let Err(e) = color_eyre::install().and_then(|()| init_tracing(cli.verbose, cli.log_json)) {
		eprintln!("{e:?}");

		return ExitCode::FAILURE;
	}

	let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
		Ok(runtime) => runtime,
		Err(e) => {
			tracing::error!(error = %e, "failed to start the async runtime");

			return ExitCode::FAILURE;
		},
	};

	ExitCode::from(runtime.block_on(execute(cli)))
}

/// Loads [`Config`] from the environment and hands off to [`execute_with`].
pub async fn execute(cli: Cli) -> u8 {
	match Config::from_env() {
		Ok(config) => execute_with(cli, config).await,
		Err(e) => report(&Err(e.into())),
	}
}

/// Runs the command, prints its output to stdout, logs any failure, and returns the exit status.
pub async fn execute_with(cli: Cli, config: Config) -> u8 {
	let result = run(cli, config)
		.await
		.and_then(|output| render_json(&output))
		.map(|rendered| println!("{rendered}"));

	report(&result)
}

fn report(result: &CliResult<()>) -> u8 {
	if let Err(e) = result {
		tracing::error!("{e:#}");
	}

	exit_status(result)
}

/// Maps an outcome to `0` on success and `1` on any failure.
pub fn exit_status<T, E>(result: &Result<T, E>) -> u8 {
	if result.is_ok() { 0 } else { 1 }
}

/// Pretty-prints `value` with four-space indentation.
pub fn render_json(value: &Value) -> CliResult<String> {
	let mut buf = Vec::new();
	let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));

	value.serialize(&mut ser)?;

	Ok(String::from_utf8(buf)?)
}

fn token_summary(record: &crate::auth::TokenRecord) -> CliResult<Value> {
	let now = OffsetDateTime::now_utc();
	let expires_at = record.expires_at.format(&Rfc3339)?;

	Ok(json!({
		"expires_at": expires_at,
		"expires_in": record.remaining_at(now).whole_seconds(),
		"status": record.status_at(now),
	}))
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
		_ => Err(format!("expected `key=value`, got `{raw}`")),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use clap::CommandFactory;
	// self
	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn sanction_defaults_to_sample_lookup() {
		let cli = Cli::try_parse_from(["sanction-client", "sanction"]).expect("Defaults should parse.");

		assert_eq!(cli.cache, CacheKind::File);
		assert!(!cli.force_refresh);
		assert!(matches!(
			cli.command,
			Command::Sanction { ref project, ref chain, ref address }
				if project == "partner"
					&& chain == "bitcoin_mainnet"
					&& address == "12udabs2TkX7NXCSj6KpqXfakjE52ZPLhz"
		));
	}

	#[test]
	fn global_flags_follow_subcommands() {
		let cli = Cli::try_parse_from([
			"sanction-client",
			"get",
			"/api/v1/risk",
			"--query",
			"chain=bitcoin_mainnet",
			"-q",
			"address=1abc",
			"--cache",
			"memory",
			"--force-refresh",
			"--expiry-leeway",
			"60",
		])
		.expect("Get command should parse.");
		let request = cli.token_request();

		assert_eq!(cli.cache, CacheKind::Memory);
		assert!(request.force);
		assert_eq!(request.expiry_leeway, Duration::minutes(1));
		assert!(matches!(
			cli.command,
			Command::Get { ref path, ref query }
				if path == "/api/v1/risk"
					&& query == &[
						("chain".to_owned(), "bitcoin_mainnet".to_owned()),
						("address".to_owned(), "1abc".to_owned()),
					]
		));
	}

	#[test]
	fn rejects_malformed_query_pairs() {
		assert!(parse_key_value("novalue").is_err());
		assert!(parse_key_value("=x").is_err());
		assert_eq!(parse_key_value("a=b=c"), Ok(("a".into(), "b=c".into())));
	}

	#[test]
	fn renders_with_four_space_indent() {
		let rendered =
			render_json(&json!({ "status": "ok", "hits": [1] })).expect("JSON should render.");

		assert_eq!(rendered, "{\n    \"hits\": [\n        1\n    ],\n    \"status\": \"ok\"\n}");
	}

	#[test]
	fn exit_status_is_one_on_failure() {
		assert_eq!(exit_status::<(), &str>(&Ok(())), 0);
		assert_eq!(exit_status::<(), &str>(&Err("API request failed")), 1);
	}
}
