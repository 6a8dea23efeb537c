//! Configuration for Showcase
//!
//! CLI arguments and environment variable handling using clap. The parsed
//! [`Args`] are turned into one immutable config per component at startup.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::assets::CloudinaryConfig;
use crate::auth::CREDENTIAL_TTL_SECONDS;

/// Longest credential lifetime accepted, ten years
pub const MAX_CREDENTIAL_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Teacher access code used in dev mode when none is configured
pub const DEV_TEACHER_CODE: &str = "dev-teacher-code";

/// Showcase - gallery gateway for student projects
#[derive(Parser, Debug, Clone)]
#[command(name = "showcase")]
#[command(about = "Authenticated gateway for the student project gallery")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory stores, dev signing secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: `text` or `json`
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// MongoDB connection URI for identities
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "showcase")]
    pub mongodb_db: String,

    /// Secret for signing bearer credentials (required in production)
    #[arg(long, env = "AUTH_SECRET")]
    pub auth_secret: Option<String>,

    /// Credential lifetime in seconds
    #[arg(long, env = "CREDENTIAL_TTL_SECONDS", default_value_t = CREDENTIAL_TTL_SECONDS)]
    pub credential_ttl_seconds: u64,

    /// Code a teacher must present at signup (required in production)
    #[arg(long, env = "TEACHER_ACCESS_CODE")]
    pub teacher_access_code: Option<String>,

    /// Asset repository configuration
    #[command(flatten)]
    pub cloudinary: CloudinaryArgs,

    /// Upstream request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Largest accepted upload body in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "104857600")]
    pub max_upload_bytes: usize,
}

/// Cloudinary account settings
#[derive(Parser, Debug, Clone, Default)]
pub struct CloudinaryArgs {
    #[arg(long = "cloudinary-cloud-name", env = "CLOUDINARY_CLOUD_NAME")]
    pub cloud_name: Option<String>,

    #[arg(long = "cloudinary-api-key", env = "CLOUDINARY_API_KEY")]
    pub api_key: Option<String>,

    #[arg(long = "cloudinary-api-secret", env = "CLOUDINARY_API_SECRET")]
    pub api_secret: Option<String>,

    /// Folder uploads land in and listing is scoped to
    #[arg(long = "cloudinary-folder", env = "CLOUDINARY_FOLDER", default_value = "steam4all")]
    pub folder: String,

    /// API base URL
    #[arg(
        long = "cloudinary-api-base",
        env = "CLOUDINARY_API_BASE",
        default_value = "https://api.cloudinary.com/v1_1"
    )]
    pub api_base: String,
}

impl CloudinaryArgs {
    /// Whether all credentials are present
    pub fn is_configured(&self) -> bool {
        [&self.cloud_name, &self.api_key, &self.api_secret]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

impl Args {
    /// Teacher access code, falling back to [`DEV_TEACHER_CODE`] in dev mode
    pub fn teacher_code(&self) -> String {
        match self.teacher_access_code.as_deref() {
            Some(code) if !code.trim().is_empty() => code.trim().to_string(),
            _ if self.dev_mode => DEV_TEACHER_CODE.to_string(),
            _ => String::new(),
        }
    }

    /// Whether to emit JSON log lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Cloudinary settings, if all credentials are present
    pub fn cloudinary_config(&self) -> Option<CloudinaryConfig> {
        if !self.cloudinary.is_configured() {
            return None;
        }

        Some(CloudinaryConfig {
            cloud_name: self.cloudinary.cloud_name.clone().unwrap_or_default(),
            api_key: self.cloudinary.api_key.clone().unwrap_or_default(),
            api_secret: self.cloudinary.api_secret.clone().unwrap_or_default(),
            folder: self.cloudinary.folder.clone(),
            api_base: self.cloudinary.api_base.clone(),
            request_timeout: self.request_timeout(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.auth_secret.as_deref().is_none_or(str::is_empty) {
                return Err("AUTH_SECRET is required in production mode".to_string());
            }
            if self.teacher_code().is_empty() {
                return Err("TEACHER_ACCESS_CODE is required in production mode".to_string());
            }
            if self.mongodb_uri.is_none() {
                return Err("MONGODB_URI is required in production mode".to_string());
            }
            if !self.cloudinary.is_configured() {
                return Err(
                    "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET are required in production mode"
                        .to_string(),
                );
            }
        }

        if self.credential_ttl_seconds == 0 {
            return Err("CREDENTIAL_TTL_SECONDS must be positive".to_string());
        }
        if self.credential_ttl_seconds > MAX_CREDENTIAL_TTL_SECONDS {
            return Err(format!(
                "CREDENTIAL_TTL_SECONDS must be at most {}",
                MAX_CREDENTIAL_TTL_SECONDS
            ));
        }

        if !matches!(self.log_format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err("LOG_FORMAT must be 'text' or 'json'".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("showcase").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_dev_mode_needs_nothing() {
        let args = parse(&["--dev-mode"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.teacher_code(), DEV_TEACHER_CODE);
        assert!(args.cloudinary_config().is_none());
        assert_eq!(args.cloudinary.folder, "steam4all");
    }

    #[test]
    fn test_production_requires_secret() {
        let args = parse(&["--teacher-access-code", "code"]);
        let err = args.validate().unwrap_err();
        assert!(err.contains("AUTH_SECRET"));
    }

    #[test]
    fn test_production_complete() {
        let args = parse(&[
            "--auth-secret",
            "0123456789abcdef0123456789abcdef",
            "--teacher-access-code",
            " StEaM ",
            "--mongodb-uri",
            "mongodb://localhost:27017",
            "--cloudinary-cloud-name",
            "demo",
            "--cloudinary-api-key",
            "key",
            "--cloudinary-api-secret",
            "secret",
        ]);
        assert!(args.validate().is_ok());
        assert_eq!(args.teacher_code(), "StEaM");

        let cloudinary = args.cloudinary_config().unwrap();
        assert_eq!(cloudinary.cloud_name, "demo");
        assert_eq!(cloudinary.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_credential_lifetime_is_bounded() {
        let args = parse(&["--dev-mode", "--credential-ttl-seconds", "18446744073709551615"]);
        assert!(args.validate().unwrap_err().contains("at most"));
        assert!(parse(&["--dev-mode", "--credential-ttl-seconds", "0"]).validate().is_err());
    }

    #[test]
    fn test_log_format_is_checked() {
        let args = parse(&["--dev-mode", "--log-format", "xml"]);
        assert!(args.validate().is_err());
        assert!(parse(&["--log-format", "JSON"]).json_logs());
    }
}
