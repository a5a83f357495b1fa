use std::{
    env,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

/// Where moments are persisted, parsed from `MOMENTS_STORE_URL`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreUrl {
    /// `dynamodb://<table>`
    DynamoDb { table_name: String },
    /// `memory://`
    Memory,
}

impl FromStr for StoreUrl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| format!("expected <scheme>://..., got '{}'", s))?;
        match scheme {
            "dynamodb" => {
                let table_name = rest.trim_end_matches('/');
                if table_name.is_empty() || table_name.contains('/') {
                    return Err(format!("expected dynamodb://<table>, got '{}'", s));
                }
                Ok(StoreUrl::DynamoDb {
                    table_name: table_name.to_string(),
                })
            }
            "memory" => Ok(StoreUrl::Memory),
            other => Err(format!("unsupported store scheme '{}'", other)),
        }
    }
}

/// Origins allowed by CORS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl FromStr for AllowedOrigins {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "*" {
            return Ok(AllowedOrigins::Any);
        }
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() {
            return Err("expected '*' or a comma separated list of origins".to_string());
        }
        Ok(AllowedOrigins::List(origins))
    }
}

#[derive(Clone, Debug)] // Clone needed if passed around, Debug for logging
pub struct Config {
    pub bind_address: SocketAddr,
    pub store_url: StoreUrl,
    // Converted to an SDK `Region` when the DynamoDB client is built
    pub aws_region: String,
    // Optional endpoint for LocalStack
    pub localstack_endpoint: Option<String>,
    pub allowed_origins: AllowedOrigins,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!(".env file loaded from path: {}", path.display()),
            Err(_) => tracing::debug!(".env file not found, relying on environment variables"),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host: IpAddr = parse_var(&lookup, "BIND_HOST", "0.0.0.0")?;
        let port: u16 = parse_var(&lookup, "PORT", "5000")?;
        let bind_address = SocketAddr::new(host, port);

        let store_url = parse_var(&lookup, "MOMENTS_STORE_URL", "dynamodb://moments")?;

        let aws_region = lookup("AWS_DEFAULT_REGION").unwrap_or_else(|| "ca-central-1".to_string());

        // Allow overriding endpoint for localstack/testing
        let localstack_endpoint = lookup("AWS_ENDPOINT_URL").filter(|s| !s.is_empty());

        let allowed_origins = parse_var(&lookup, "CORS_ALLOWED_ORIGINS", "*")?;

        Ok(Config {
            bind_address,
            store_url,
            aws_region,
            localstack_endpoint,
            allowed_origins,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    let raw = lookup(key).unwrap_or_else(|| {
        tracing::debug!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e: T::Err| ConfigError::InvalidVar(key.to_string(), e.to_string()))
}
