//! Poller configuration
//!
//! Defines all configurable parameters for the poller including the polling
//! interval, failure backoff, state directory and SMTP delivery settings.

use std::path::PathBuf;
use std::time::Duration;

/// Poller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the job registry and marker files
    pub state_dir: PathBuf,

    /// Wait between checks while the feed is healthy
    pub poll_interval: Duration,

    /// Upper bound for the wait after repeated failed checks
    pub max_backoff: Duration,

    /// Random extra wait added to backoff delays, as a fraction (0.0 to 1.0)
    pub backoff_jitter: f64,

    /// Replaces the site's own base URL (e.g. to point at a mirror)
    pub feed_base_url: Option<String>,

    /// Outgoing mail settings
    pub smtp: SmtpConfig,
}

/// SMTP submission settings
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay host, contacted with STARTTLS
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; falls back to the username
    pub from: Option<String>,
}

impl SmtpConfig {
    /// Address notifications are sent from
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from: None,
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .finish()
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables (all optional):
    /// - STOCKWATCH_STATE_DIR (default: current directory)
    /// - POLL_INTERVAL (seconds, default: 60)
    /// - MAX_BACKOFF (seconds, default: 1800)
    /// - BACKOFF_JITTER (fraction, default: 0.1)
    /// - FEED_BASE_URL
    /// - SMTP_SERVER (default: smtp.gmail.com)
    /// - SMTP_PORT (default: 587)
    /// - SMTP_USERNAME, SMTP_PASSWORD, SMTP_FROM
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secs = |name: &str| {
            lookup(name)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        Self {
            state_dir: non_empty("STOCKWATCH_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            poll_interval: secs("POLL_INTERVAL").unwrap_or(defaults.poll_interval),
            max_backoff: secs("MAX_BACKOFF").unwrap_or(defaults.max_backoff),
            backoff_jitter: lookup("BACKOFF_JITTER")
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(defaults.backoff_jitter),
            feed_base_url: non_empty("FEED_BASE_URL"),
            smtp: SmtpConfig {
                server: non_empty("SMTP_SERVER").unwrap_or(defaults.smtp.server),
                port: lookup("SMTP_PORT")
                    .and_then(|s| s.trim().parse::<u16>().ok())
                    .unwrap_or(defaults.smtp.port),
                username: non_empty("SMTP_USERNAME"),
                password: non_empty("SMTP_PASSWORD"),
                from: non_empty("SMTP_FROM"),
            },
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_backoff < self.poll_interval {
            anyhow::bail!("max_backoff must not be shorter than poll_interval");
        }

        if !(0.0..=1.0).contains(&self.backoff_jitter) {
            anyhow::bail!("backoff_jitter must be between 0.0 and 1.0");
        }

        if let Some(url) = &self.feed_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("feed_base_url must start with http:// or https://");
            }
        }

        if self.smtp.server.is_empty() {
            anyhow::bail!("smtp server cannot be empty");
        }

        if self.smtp.port == 0 {
            anyhow::bail!("smtp port must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
            poll_interval: Duration::from_secs(60),
            max_backoff: Duration::from_secs(1800),
            backoff_jitter: 0.1,
            feed_base_url: None,
            smtp: SmtpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.smtp.server, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_vars() {
        let config = Config::from_lookup(lookup(&[
            ("STOCKWATCH_STATE_DIR", "/var/lib/stockwatch"),
            ("POLL_INTERVAL", "30"),
            ("SMTP_SERVER", "mail.example.com"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USERNAME", "bot@example.com"),
            ("SMTP_PASSWORD", "hunter2"),
        ]));

        assert_eq!(config.state_dir, PathBuf::from("/var/lib/stockwatch"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.smtp.server, "mail.example.com");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.sender(), Some("bot@example.com"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = Config::from_lookup(lookup(&[
            ("POLL_INTERVAL", "soon"),
            ("SMTP_PORT", "99999"),
            ("SMTP_USERNAME", "   "),
        ]));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.username, None);
    }

    #[test]
    fn test_sender_prefers_from() {
        let smtp = SmtpConfig {
            username: Some("login@example.com".to_string()),
            from: Some("alerts@example.com".to_string()),
            ..SmtpConfig::default()
        };
        assert_eq!(smtp.sender(), Some("alerts@example.com"));
    }

    #[test]
    fn test_debug_hides_password() {
        let smtp = SmtpConfig {
            password: Some("hunter2".to_string()),
            ..SmtpConfig::default()
        };
        assert!(!format!("{:?}", smtp).contains("hunter2"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(60);

        config.max_backoff = Duration::from_secs(10);
        assert!(config.validate().is_err());
        config.max_backoff = Duration::from_secs(600);

        config.backoff_jitter = 1.5;
        assert!(config.validate().is_err());
        config.backoff_jitter = 0.0;

        config.feed_base_url = Some("localhost:9000".to_string());
        assert!(config.validate().is_err());
        config.feed_base_url = Some("http://localhost:9000".to_string());

        assert!(config.validate().is_ok());
    }
}
