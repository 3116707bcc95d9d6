use std::path::PathBuf;
use std::time::Duration;

/// Default wttr.in endpoint for the weather lookup.
const DEFAULT_WEATHER_BASE_URL: &str = "https://wttr.in";
const DEFAULT_RIDES_CSV_PATH: &str = "./data/rides.csv";
/// Default circumnavigation target (equatorial circumference, km).
const DEFAULT_CHALLENGE_TARGET_KM: f64 = 40075.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set when STORAGE_BACKEND={1}")]
    Missing(&'static str, &'static str),
    #[error("{0} must be set for {1}")]
    Required(&'static str, &'static str),
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Which storage backend the process talks to. Chosen once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    /// Local flat-file table.
    Csv { path: PathBuf },
    /// Hosted Postgres table (e.g. Supabase).
    Postgres { database_url: String },
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Csv { .. } => "csv",
            BackendConfig::Postgres { .. } => "postgres",
        }
    }
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub port: u16,
    pub weather_base_url: String,
    pub weather_timeout: Duration,
    /// Upper bound on a single storage call.
    pub backend_timeout: Duration,
    /// Optional GPX file replacing the built-in route.
    pub route_gpx: Option<PathBuf>,
    pub challenge_target_km: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = match var("STORAGE_BACKEND")
            .unwrap_or_else(|| "csv".to_string())
            .to_lowercase()
            .as_str()
        {
            "csv" => BackendConfig::Csv {
                path: var("RIDES_CSV_PATH")
                    .unwrap_or_else(|| DEFAULT_RIDES_CSV_PATH.to_string())
                    .into(),
            },
            "postgres" | "supabase" => BackendConfig::Postgres {
                database_url: var("DATABASE_URL")
                    .ok_or(ConfigError::Missing("DATABASE_URL", "postgres"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let port = parse_or("PORT", var("PORT"), 5001u16)?;
        let weather_timeout_secs = parse_or("WEATHER_TIMEOUT_SECS", var("WEATHER_TIMEOUT_SECS"), 10u64)?;
        let backend_timeout_secs = parse_or("BACKEND_TIMEOUT_SECS", var("BACKEND_TIMEOUT_SECS"), 15u64)?;
        let challenge_target_km = parse_or(
            "CHALLENGE_TARGET_KM",
            var("CHALLENGE_TARGET_KM"),
            DEFAULT_CHALLENGE_TARGET_KM,
        )?;
        if !challenge_target_km.is_finite() || challenge_target_km <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "CHALLENGE_TARGET_KM",
                value: challenge_target_km.to_string(),
            });
        }

        Ok(Self {
            backend,
            port,
            weather_base_url: var("WEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
            weather_timeout: Duration::from_secs(weather_timeout_secs),
            backend_timeout: Duration::from_secs(backend_timeout_secs),
            route_gpx: var("ROUTE_GPX").map(PathBuf::from),
            challenge_target_km,
        })
    }
}

/// Settings for the `migrate-csv` command: the CSV table to read and the
/// Postgres table to fill, whatever `STORAGE_BACKEND` says.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub csv_path: PathBuf,
    pub database_url: String,
    pub backend_timeout: Duration,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let backend_timeout_secs = parse_or("BACKEND_TIMEOUT_SECS", var("BACKEND_TIMEOUT_SECS"), 15u64)?;
        Ok(Self {
            csv_path: var("RIDES_CSV_PATH")
                .unwrap_or_else(|| DEFAULT_RIDES_CSV_PATH.to_string())
                .into(),
            database_url: var("DATABASE_URL")
                .ok_or(ConfigError::Required("DATABASE_URL", "migrate-csv"))?,
            backend_timeout: Duration::from_secs(backend_timeout_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
