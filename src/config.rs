use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub seed_demo: bool,
    pub watch_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_path: env::var("WELLNESS_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/wellness.json")),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(8080),
            // Anything but an explicit "false"/"0" keeps the demo history on.
            seed_demo: env::var("WELLNESS_SEED_DEMO")
                .map(|value| !matches!(value.trim(), "false" | "0"))
                .unwrap_or(true),
            watch_interval: Duration::from_millis(
                env::var("WELLNESS_WATCH_MS")
                    .ok()
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(1000),
            ),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
