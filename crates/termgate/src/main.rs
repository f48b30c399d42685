use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use termgate::prelude::*;
use tracing_subscriber::EnvFilter;

/// Upper bound for `--session-ttl`: one day.
const MAX_SESSION_TTL_SECS: u64 = 86_400;

#[derive(Parser)]
#[command(name = "termgate", version)]
#[command(about = "Terminal session broker for a collaboration server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP broker
    Serve(ServeArgs),
    /// Read a secret from stdin and print its stored (encrypted) form
    Encrypt {
        #[arg(long, env = "TERMGATE_ENCRYPTION_KEY", hide_env_values = true)]
        encryption_key: String,
    },
    /// Print a fresh random encryption key
    Keygen,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "TERMGATE_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Deployment secret used to decrypt stored credentials
    #[arg(long, env = "TERMGATE_ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: String,

    /// Base URL of the collaboration server
    #[arg(long, env = "TERMGATE_COLLAB_URL", default_value = "ws://localhost:1234")]
    collab_url: String,

    /// Seconds a session payload stays in the cache (1 to 86400)
    #[arg(
        long,
        env = "TERMGATE_SESSION_TTL",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECS)
    )]
    session_ttl: u64,

    /// Redis URL for the session cache (in-memory if unset)
    #[arg(long, env = "TERMGATE_REDIS_URL")]
    redis_url: Option<String>,

    /// Postgres URL for connections and the ledger (in-memory if unset)
    #[arg(long, env = "TERMGATE_DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Accepted bearer token, as USER=TOKEN (repeatable)
    #[arg(
        long = "api-token",
        env = "TERMGATE_API_TOKENS",
        value_delimiter = ',',
        value_parser = parse_token_pair,
        hide_env_values = true
    )]
    api_tokens: Vec<(String, String)>,
}

fn parse_token_pair(s: &str) -> Result<(String, String), String> {
    let (user, token) = s
        .split_once('=')
        .ok_or_else(|| format!("expected USER=TOKEN, got '{s}'"))?;
    if user.is_empty() || token.is_empty() {
        return Err(format!("expected USER=TOKEN, got '{s}'"));
    }
    Ok((user.to_string(), token.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), TermgateError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::Encrypt { encryption_key } => {
            let vault = CredentialVault::new(EncryptionKey::from_secret(&encryption_key)?);
            let mut secret = String::new();
            std::io::stdin().read_to_string(&mut secret)?;
            println!("{}", vault.encrypt(secret.trim_end_matches(['\r', '\n'])));
        }
        Commands::Keygen => {
            let (_, encoded) = EncryptionKey::generate();
            println!("{encoded}");
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), TermgateError> {
    let vault = CredentialVault::new(EncryptionKey::from_secret(&args.encryption_key)?);

    let mut config = BrokerConfig::new(args.collab_url);
    config.session_ttl = Duration::from_secs(args.session_ttl);

    let auth = args
        .api_tokens
        .into_iter()
        .fold(StaticTokenAuthenticator::new(), |auth, (user, token)| {
            auth.with_token(token, UserId::new(user))
        });
    tracing::info!(tokens = auth.len(), "static token authenticator loaded");

    let mut builder = TermgateServer::builder()
        .bind(&args.bind)
        .broker_config(config)
        .vault(vault)
        .authenticator(auth);

    if let Some(url) = args.redis_url {
        builder = builder.cache(redis_cache(&url).await?);
    }
    if let Some(url) = args.database_url {
        let (connections, ledger) = postgres_store(&url).await?;
        builder = builder.connections(connections).ledger(ledger);
    }

    builder.build().await?.run().await
}

#[cfg(feature = "redis")]
async fn redis_cache(url: &str) -> Result<Arc<dyn SessionCache>, TermgateError> {
    Ok(Arc::new(RedisSessionCache::connect(url).await?))
}

#[cfg(not(feature = "redis"))]
async fn redis_cache(_url: &str) -> Result<Arc<dyn SessionCache>, TermgateError> {
    Err(TermgateError::Config("built without redis support".into()))
}

#[cfg(feature = "postgres")]
async fn postgres_store(
    url: &str,
) -> Result<(Arc<dyn ConnectionRepository>, Arc<dyn SessionLedger>), TermgateError> {
    let store = Arc::new(PgStore::connect(url).await?);
    store.migrate().await?;
    let connections: Arc<dyn ConnectionRepository> = store.clone();
    let ledger: Arc<dyn SessionLedger> = store;
    Ok((connections, ledger))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_store(
    _url: &str,
) -> Result<(Arc<dyn ConnectionRepository>, Arc<dyn SessionLedger>), TermgateError> {
    Err(TermgateError::Config("built without postgres support".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_pair() {
        assert_eq!(
            parse_token_pair("u1=secret-token"),
            Ok(("u1".to_string(), "secret-token".to_string()))
        );
    }

    #[test]
    fn test_parse_token_pair_keeps_equals_in_token() {
        assert_eq!(
            parse_token_pair("u1=abc=="),
            Ok(("u1".to_string(), "abc==".to_string()))
        );
    }

    #[test]
    fn test_parse_token_pair_rejects_malformed() {
        assert!(parse_token_pair("no-separator").is_err());
        assert!(parse_token_pair("=token").is_err());
        assert!(parse_token_pair("user=").is_err());
    }

    fn parse_ttl(value: &str) -> Result<u64, clap::Error> {
        let cli = Cli::try_parse_from([
            "termgate",
            "serve",
            "--encryption-key",
            "k",
            "--session-ttl",
            value,
        ])?;
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        Ok(args.session_ttl)
    }

    #[test]
    fn test_cli_session_ttl_accepts_range_bounds() {
        assert_eq!(parse_ttl("1").unwrap(), 1);
        assert_eq!(parse_ttl("86400").unwrap(), 86_400);
    }

    #[test]
    fn test_cli_session_ttl_rejects_out_of_range() {
        assert!(parse_ttl("0").is_err());
        assert!(parse_ttl("86401").is_err());
        assert!(parse_ttl("18446744073709551615").is_err());
    }

    #[test]
    fn test_cli_parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "termgate",
            "serve",
            "--encryption-key",
            "k",
            "--collab-url",
            "ws://collaboration:1234",
            "--api-token",
            "u1=t1",
            "--api-token",
            "u2=t2",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.collab_url, "ws://collaboration:1234");
        assert_eq!(args.session_ttl, 60);
        assert_eq!(args.api_tokens.len(), 2);
        assert!(args.redis_url.is_none());
    }
}
