use std::env;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrinterEndpoint {
    pub number: String,
    pub url: String,
}

pub struct AppConfig {
    pub http_bind: String,
    pub sheet_api_url: Option<String>,
    pub sheet_refresh: Duration,
    pub printers: Vec<PrinterEndpoint>,
    pub printer_refresh: Duration,
    pub request_timeout: Duration,
    pub preferences_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let printers = env::var("PRINTERS")
            .ok()
            .map(|raw| parse_printers(&raw))
            .unwrap_or_else(default_printers);
        Self {
            http_bind: env_var("HTTP_BIND", "0.0.0.0:8080"),
            sheet_api_url: env::var("SHEET_API_URL")
                .ok()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            sheet_refresh: secs_var("SHEET_REFRESH_SECS", 30),
            printers,
            printer_refresh: secs_var("PRINTER_REFRESH_SECS", 5),
            request_timeout: secs_var("REQUEST_TIMEOUT_SECS", 10),
            preferences_path: env_var("PREFERENCES_PATH", "statusboard-prefs.json"),
        }
    }
}

fn env_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs_var(key: &str, default: u64) -> Duration {
    let secs = env_var(key, &default.to_string())
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Parses `number=url` pairs separated by commas. Malformed entries are skipped.
pub fn parse_printers(raw: &str) -> Vec<PrinterEndpoint> {
    raw.split(',')
        .filter_map(|entry| {
            let (number, url) = entry.split_once('=')?;
            let number = number.trim();
            let url = url.trim();
            if number.is_empty() || url.is_empty() {
                tracing::warn!("Ignoring malformed printer entry {entry:?}");
                return None;
            }
            Some(PrinterEndpoint {
                number: number.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

fn default_printers() -> Vec<PrinterEndpoint> {
    (1..=12)
        .map(|n| PrinterEndpoint {
            number: format!("{n:02}"),
            url: format!("http://192.168.0.{}/status", 100 + n),
        })
        .collect()
}
