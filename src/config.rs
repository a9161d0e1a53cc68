use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub boards: BoardConfig,
    pub admin: AdminConfig,
    pub github: GitHubConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the static portfolio pages and assets
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Max request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON blob per storage key
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Board names served by the local and remote boards
    #[serde(default = "default_boards")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Argon2 PHC string the admin password is verified against
    pub password_hash: String,
    /// Lifetime of an admin session in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins (comma-separated, or "*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Throttle mutating requests per IP
    #[serde(default = "default_write_rate_limit")]
    pub write_rate_limit_enabled: bool,
    /// Mutating requests per minute per IP
    #[serde(default = "default_write_rate_limit_rpm")]
    pub write_rate_limit_rpm: u32,
    /// Key the write limit on `X-Forwarded-For` (only behind a trusted proxy)
    #[serde(default)]
    pub trust_proxy_headers: bool,
    /// Cleanup interval in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_static_dir() -> String { "static".to_string() }
fn default_max_body_size() -> usize { 64 * 1024 } // 64 KiB
fn default_data_dir() -> String { "data".to_string() }
fn default_boards() -> Vec<String> {
    ["general", "algorithm", "coding-test", "cs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_session_ttl() -> u64 { 24 * 60 * 60 }
fn default_github_api_base() -> String { "https://api.github.com".to_string() }
fn default_user_agent() -> String { concat!("portfolio-boards/", env!("CARGO_PKG_VERSION")).to_string() }
fn default_cors_origins() -> String { "*".to_string() }
fn default_write_rate_limit() -> bool { true }
fn default_write_rate_limit_rpm() -> u32 { 30 }
fn default_cleanup_interval() -> u64 { 300 } // 5 minutes

impl GitHubConfig {
    pub fn is_configured(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }
}

impl BoardConfig {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let password_hash = match (
            std::env::var("ADMIN_PASSWORD_HASH").ok().filter(|s| !s.is_empty()),
            std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
        ) {
            (Some(hash), _) => hash,
            (None, Some(plain)) => {
                tracing::warn!("ADMIN_PASSWORD is set in plaintext; prefer ADMIN_PASSWORD_HASH");
                crate::auth::hash_password(&plain).context("hashing ADMIN_PASSWORD")?
            }
            (None, None) => bail!("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set"),
        };

        let names = match std::env::var("BOARDS") {
            Ok(list) => parse_board_list(&list)?,
            Err(_) => default_boards(),
        };

        Ok(Config {
            server: ServerConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
                port: std::env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_port),
                static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| default_static_dir()),
                max_body_size: std::env::var("MAX_BODY_SIZE")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_max_body_size),
            },
            storage: StorageConfig {
                data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| default_data_dir()),
            },
            boards: BoardConfig { names },
            admin: AdminConfig {
                password_hash,
                session_ttl_secs: parse_session_ttl(std::env::var("SESSION_TTL_SECS").ok())?,
            },
            github: GitHubConfig {
                api_base: std::env::var("GITHUB_API_BASE")
                    .unwrap_or_else(|_| default_github_api_base()),
                owner: std::env::var("GITHUB_OWNER").unwrap_or_default(),
                repo: std::env::var("GITHUB_REPO").unwrap_or_default(),
                user_agent: std::env::var("GITHUB_USER_AGENT")
                    .unwrap_or_else(|_| default_user_agent()),
            },
            security: SecurityConfig {
                cors_origins: std::env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| default_cors_origins()),
                write_rate_limit_enabled: std::env::var("WRITE_RATE_LIMIT_ENABLED")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_write_rate_limit),
                write_rate_limit_rpm: std::env::var("WRITE_RATE_LIMIT_RPM")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_write_rate_limit_rpm),
                trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_default(),
                cleanup_interval_secs: std::env::var("CLEANUP_INTERVAL_SECS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_cleanup_interval),
            },
        })
    }
}

/// Session lifetime in seconds; unset means the default, anything else must be 1..=one year
fn parse_session_ttl(raw: Option<String>) -> Result<u64> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(default_session_ttl());
    };
    let ttl: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("SESSION_TTL_SECS must be a number of seconds, got '{}'", raw))?;
    if ttl == 0 || ttl > crate::auth::MAX_SESSION_TTL_SECS {
        bail!(
            "SESSION_TTL_SECS must be between 1 and {}, got {}",
            crate::auth::MAX_SESSION_TTL_SECS,
            ttl
        );
    }
    Ok(ttl)
}

/// Parse a comma-separated board list, rejecting malformed names
fn parse_board_list(list: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        crate::models::validate_board_name(name)
            .map_err(|e| anyhow::anyhow!("invalid board name '{}': {}", name, e))?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        bail!("BOARDS must name at least one board");
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board_list() {
        let names = parse_board_list(" algorithm, cs ,,cs").unwrap();
        assert_eq!(names, vec!["algorithm", "cs"]);

        assert!(parse_board_list("Bad Name").is_err());
        assert!(parse_board_list(" , ").is_err());
    }

    #[test]
    fn test_parse_session_ttl() {
        assert_eq!(parse_session_ttl(None).unwrap(), default_session_ttl());
        assert_eq!(parse_session_ttl(Some(" ".into())).unwrap(), default_session_ttl());
        assert_eq!(parse_session_ttl(Some("3600".into())).unwrap(), 3600);
        assert_eq!(
            parse_session_ttl(Some(crate::auth::MAX_SESSION_TTL_SECS.to_string())).unwrap(),
            crate::auth::MAX_SESSION_TTL_SECS
        );

        assert!(parse_session_ttl(Some("0".into())).is_err());
        assert!(parse_session_ttl(Some("10000000000000".into())).is_err());
        assert!(parse_session_ttl(Some(u64::MAX.to_string())).is_err());
        assert!(parse_session_ttl(Some("a day".into())).is_err());
    }

    #[test]
    fn test_default_boards() {
        let boards = BoardConfig { names: default_boards() };
        assert!(boards.contains("coding-test"));
        assert!(!boards.contains("random"));
    }
}
