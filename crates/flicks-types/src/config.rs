use clap::Args;
use std::{path::PathBuf, time::Duration};

/// Database connection settings, shared by the server and anything else that opens the catalogue.
#[derive(Debug, Clone, Args)]
pub struct DbConfig {
    #[arg(
        long,
        env = "FLICKS_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/flicks.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "FLICKS_DATA_DIR",
        help = "Data directory (database and other files), default is system default like ~/.local/share/flicks",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long = "db-max-open-conns",
        env = "FLICKS_DB_MAX_OPEN_CONNS",
        default_value_t = 25,
        help = "Maximum number of open database connections"
    )]
    pub max_open_conns: u32,

    #[arg(
        long = "db-max-idle-conns",
        env = "FLICKS_DB_MAX_IDLE_CONNS",
        default_value_t = 25,
        help = "Maximum number of idle connections kept in the pool (capped by max open connections)"
    )]
    pub max_idle_conns: u32,

    #[arg(
        long = "db-max-idle-time",
        env = "FLICKS_DB_MAX_IDLE_TIME",
        default_value = "15m",
        help = "Idle time after which a connection is closed, in human friendly format (e.g. 15m, 1h 30s)",
        value_parser = humantime::parse_duration
    )]
    pub max_idle_time: Duration,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("flicks"))
        .unwrap_or_else(|| PathBuf::from("flicks"))
        .to_string_lossy()
        .to_string()
}

impl DbConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/flicks.db", self.data_dir))
    }

    pub fn max_idle_conns(&self) -> u32 {
        self.max_idle_conns.min(self.max_open_conns)
    }
}
