use crate::http::error::HttpError;
use anyhow::Context;

/// Application settings, read from `APP_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mime_type: String,
    pub charset: String,
    pub http_version: String,
    pub gzip: bool,
    pub site_uri: Option<String>,
    pub media_uri: Option<String>,
    pub cacheable: bool,
    pub sapi: String,
    pub cgi_fix_pathinfo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mime_type: "text/html".to_string(),
            charset: "utf-8".to_string(),
            http_version: "1.1".to_string(),
            gzip: false,
            site_uri: None,
            media_uri: None,
            cacheable: true,
            sapi: "cgi".to_string(),
            cgi_fix_pathinfo: true,
        }
    }
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool, HttpError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" | "" => Ok(false),
        _ => Err(HttpError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<AppConfig> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::default();

        let flag = |key: &str, default: bool| -> anyhow::Result<bool> {
            match lookup(key) {
                Some(v) => parse_bool(key, &v).with_context(|| format!("Failed to read {}", key)),
                None => Ok(default),
            }
        };
        config.gzip = flag("APP_GZIP", config.gzip)?;
        config.cacheable = flag("APP_CACHEABLE", config.cacheable)?;
        config.cgi_fix_pathinfo = flag("APP_CGI_FIX_PATHINFO", config.cgi_fix_pathinfo)?;

        if let Some(v) = lookup("APP_MIME_TYPE") {
            config.mime_type = v;
        }
        if let Some(v) = lookup("APP_CHARSET") {
            config.charset = v;
        }
        if let Some(v) = lookup("APP_HTTP_VERSION") {
            config.http_version = v;
        }
        if let Some(v) = lookup("APP_SAPI") {
            config.sapi = v;
        }
        config.site_uri = lookup("APP_SITE_URI");
        config.media_uri = lookup("APP_MEDIA_URI");

        Ok(config)
    }

    pub fn cgi_without_pathinfo(&self) -> bool {
        self.sapi.contains("cgi") && !self.cgi_fix_pathinfo
    }
}
