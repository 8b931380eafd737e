use serde::Deserialize;

/// Main configuration structure for terminal-scraper
///
/// Every section has defaults, so an empty file (or no file) is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub limits: LimitsConfig,
    pub t18: T18Config,
    pub etslink: EtsLinkConfig,
    pub storage: StorageConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LimitsConfig {
    /// Maximum number of requests in flight at once
    pub max_concurrent: u32,

    /// Minimum spacing between request admissions (milliseconds)
    pub delay_ms: u64,

    /// Additional attempts after the first failure for transient errors
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff sleep (milliseconds)
    pub backoff_max_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            delay_ms: 500,
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
        }
    }
}

/// T18 Tideworks portal (single document)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct T18Config {
    pub base_url: String,

    /// Page carrying the login form
    pub login_page: String,

    /// Form action used when the login form has none
    pub login_action: String,

    pub username_field: String,
    pub password_field: String,

    /// Page scraped after login
    pub dashboard_path: String,
}

impl Default for T18Config {
    fn default() -> Self {
        Self {
            base_url: "https://t18.tideworks.com/fc-T18".to_string(),
            login_page: "default.do".to_string(),
            login_action: "j_security_check".to_string(),
            username_field: "j_username".to_string(),
            password_field: "j_password".to_string(),
            dashboard_path: "default.do".to_string(),
        }
    }
}

/// ETSLink portal (multiple terminal locations behind one login)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EtsLinkConfig {
    pub base_url: String,
    pub login_path: String,
    pub username_field: String,
    pub password_field: String,

    /// Per-location inquiry page
    pub inquiry_path: String,

    /// Query parameter carrying the terminal code on the inquiry page
    pub terminal_param: String,

    /// Page listing the terminals available to the account, if any
    pub locations_path: Option<String>,

    /// Default location set
    pub locations: Vec<LocationEntry>,
}

impl Default for EtsLinkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.etslink.com".to_string(),
            login_path: "login".to_string(),
            username_field: "PI_LOGIN_ID".to_string(),
            password_field: "PI_PASSWORD".to_string(),
            inquiry_path: "main/inquiry".to_string(),
            terminal_param: "PI_TERMINAL_ID".to_string(),
            locations_path: None,
            locations: vec![
                LocationEntry::new("LAX", "Los Angeles"),
                LocationEntry::new("OAK", "Oakland"),
                LocationEntry::new("TIW", "Tacoma"),
            ],
        }
    }
}

/// A terminal location known to a multi-location portal
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationEntry {
    pub code: String,
    pub name: String,
}

impl LocationEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "data/terminal_scraper.db".to_string(),
        }
    }
}
