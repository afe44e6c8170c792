use std::fmt::Display;

use crate::error::Result;
pub use clap::Parser;
use flicks_app::state::AppConfig;
use flicks_types::config::DbConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "JSON API for a movie catalogue")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 4000,
        env = "FLICKS_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,

    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "FLICKS_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        value_enum,
        default_value_t = Environment::Development,
        env = "FLICKS_ENV",
        help = "Environment, reported by healthcheck"
    )]
    pub env: Environment,

    #[arg(
        long,
        env = "FLICKS_DEFAULT_PAGE_SIZE",
        default_value = "20",
        value_parser = clap::value_parser!(u32).range(1..=100),
        help = "Page size used when listing request does not specify one"
    )]
    pub default_page_size: u32,

    #[arg(long, env = "FLICKS_CORS", help = "Enable permissive CORS")]
    pub cors: bool,

    #[command(flatten)]
    pub db: DbConfig,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(value: &ServerConfig) -> Self {
        AppConfig {
            environment: value.env.to_string(),
            default_page_size: value.default_page_size,
            ..Default::default()
        }
    }
}
