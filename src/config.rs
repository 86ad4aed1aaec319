use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub task_time_limit_secs: u64,
    pub data_wait_timeout_secs: u64,
}

impl Config {
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.database_path)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ceiling for a single background query task; exceeding it marks the
    /// cache entry failed.
    pub fn task_time_limit(&self) -> Duration {
        Duration::from_secs(self.task_time_limit_secs)
    }

    /// How long a figure request will wait for data before rendering the
    /// failure placeholder.
    pub fn data_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.data_wait_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_path: "./.pulseboard/pulseboard.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8050,
            workers: 4,
            task_time_limit_secs: 300,
            data_wait_timeout_secs: 30,
        }
    }

    #[test]
    fn test_database_url_format() {
        assert_eq!(
            sample().database_url(),
            "sqlite:./.pulseboard/pulseboard.db?mode=rwc"
        );
    }

    #[test]
    fn test_server_address() {
        assert_eq!(sample().server_address(), "127.0.0.1:8050");
    }

    #[test]
    fn test_durations() {
        let config = sample();
        assert_eq!(config.task_time_limit(), Duration::from_secs(300));
        assert_eq!(config.data_wait_timeout(), Duration::from_secs(30));
    }
}
