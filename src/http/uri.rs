//! Works out where the application lives from what the server tells it.
//!
//! Two conventions are covered. Origin servers report the path the client
//! asked for in `REQUEST_URI`. Gateways only give `SCRIPT_NAME` plus
//! `QUERY_STRING`. Explicit overrides from configuration win over both.

use crate::http::environment::ServerEnvironment;
use once_cell::sync::Lazy;
use regex::Regex;

pub const URI_REQUEST: &str = "uri.request";
pub const URI_BASE_FULL: &str = "uri.base.full";
pub const URI_BASE_HOST: &str = "uri.base.host";
pub const URI_BASE_PATH: &str = "uri.base.path";
pub const URI_ROUTE: &str = "uri.route";
pub const URI_MEDIA_FULL: &str = "uri.media.full";
pub const URI_MEDIA_PATH: &str = "uri.media.path";

const FRONT_CONTROLLER: &str = "index.php";

/// The resolved URIs, computed once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedUris {
    pub request: String,
    pub base_full: String,
    pub base_host: String,
    pub base_path: String,
    /// Only set when the request lives under `base_full`.
    pub route: Option<String>,
    pub media_full: String,
    pub media_path: String,
}

impl ResolvedUris {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            URI_REQUEST => Some(&self.request),
            URI_BASE_FULL => Some(&self.base_full),
            URI_BASE_HOST => Some(&self.base_host),
            URI_BASE_PATH => Some(&self.base_path),
            URI_ROUTE => self.route.as_deref(),
            URI_MEDIA_FULL => Some(&self.media_full),
            URI_MEDIA_PATH => Some(&self.media_path),
            _ => None,
        }
    }

    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            URI_REQUEST,
            URI_BASE_FULL,
            URI_BASE_HOST,
            URI_BASE_PATH,
            URI_ROUTE,
            URI_MEDIA_FULL,
            URI_MEDIA_PATH,
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|value| (key, value)))
        .collect()
    }
}

/// Inputs to [`load_system_uris`] that do not come from the environment.
#[derive(Debug, Clone, Default)]
pub struct UriOverrides<'a> {
    pub request_uri: Option<&'a str>,
    pub site_uri: Option<&'a str>,
    pub media_uri: Option<&'a str>,
    /// Running as CGI with `fix_pathinfo` off, where `PHP_SELF` holds no path info.
    pub cgi_without_pathinfo: bool,
}

/// Scheme, credentials, host and port of a URI plus its path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub prefix: String,
    pub path: String,
}

static ABSOLUTE_URI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<authority>[^/?#]*)(?P<path>[^?#]*)")
        .unwrap()
});

impl UriParts {
    /// Splits `uri` as written, without normalizing case, ports or escapes.
    /// Without a scheme or with an empty authority the prefix is empty and
    /// the rest up to `?`/`#` is the path.
    pub fn parse(uri: &str) -> UriParts {
        if let Some(cap) = ABSOLUTE_URI_RE.captures(uri) {
            let path = cap.name("path").map_or("", |m| m.as_str()).to_string();
            return match cap.name("authority").map(|m| m.as_str()) {
                Some(authority) if !authority.is_empty() => UriParts {
                    prefix: format!("{}://{}", &cap["scheme"], authority),
                    path,
                },
                _ => UriParts {
                    prefix: String::new(),
                    path,
                },
            };
        }

        let end = uri.find(['?', '#']).unwrap_or(uri.len());
        UriParts {
            prefix: String::new(),
            path: uri[..end].to_string(),
        }
    }
}

/// Parent directory of a `/` separated path, the way POSIX `dirname` does it.
pub fn dirname(path: &str) -> &str {
    if path.is_empty() {
        return "";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        None => ".",
        Some(i) => {
            let parent = trimmed[..i].trim_end_matches('/');
            if parent.is_empty() { "/" } else { parent }
        }
    }
}

pub fn is_ssl_connection(env: &impl ServerEnvironment) -> bool {
    let https = env.get("HTTPS");
    if !https.is_empty() && !https.eq_ignore_ascii_case("off") {
        return true;
    }
    let forwarded = env.get("HTTP_X_FORWARDED_PROTO");
    !forwarded.is_empty() && forwarded.eq_ignore_ascii_case("https")
}

pub fn detect_request_uri(env: &impl ServerEnvironment) -> String {
    let scheme = if is_ssl_connection(env) { "https://" } else { "http://" };
    let php_self = env.get("PHP_SELF");
    let request_uri = env.get("REQUEST_URI");

    let mut uri = format!("{}{}", scheme, env.get("HTTP_HOST"));
    if !php_self.is_empty() && !request_uri.is_empty() {
        uri.push_str(&request_uri);
    } else {
        uri.push_str(&env.get("SCRIPT_NAME"));
        let query = env.get("QUERY_STRING");
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }
    }

    uri.replace('\'', "%27")
        .replace('"', "%22")
        .replace('<', "%3C")
        .replace('>', "%3E")
        .trim()
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Rest of `request` after a case-insensitive `base` prefix.
fn strip_prefix_ignore_case<'a>(request: &'a str, base: &str) -> Option<&'a str> {
    let head = request.as_bytes().get(..base.len())?;
    if head.eq_ignore_ascii_case(base.as_bytes()) {
        request.get(base.len()..)
    } else {
        None
    }
}

pub fn load_system_uris(env: &impl ServerEnvironment, overrides: &UriOverrides) -> ResolvedUris {
    let request = match non_empty(overrides.request_uri) {
        Some(explicit) => explicit.to_string(),
        None => detect_request_uri(env),
    };

    let (host, mut path) = match non_empty(overrides.site_uri) {
        Some(site) => {
            let parts = UriParts::parse(site);
            (parts.prefix, parts.path)
        }
        None => {
            let parts = UriParts::parse(&request);
            let script = if overrides.cgi_without_pathinfo && !env.get("REQUEST_URI").is_empty() {
                env.get("PHP_SELF")
            } else {
                env.get("SCRIPT_NAME")
            };
            (parts.prefix, dirname(&script).to_string())
        }
    };

    // Exactly the nine bytes of the first "index.php", nothing around it.
    if let Some(pos) = path.find(FRONT_CONTROLLER) {
        path.replace_range(pos..pos + FRONT_CONTROLLER.len(), "");
    }
    let path = path.trim_end_matches(['/', '\\']);

    let base_path = format!("{}/", path);
    let base_full = format!("{}{}", host, base_path);
    let route = strip_prefix_ignore_case(&request, &base_full).map(str::to_string);

    let (media_full, media_path) = match non_empty(overrides.media_uri) {
        Some(media) if media.contains("://") => (media.to_string(), media.to_string()),
        Some(media) => {
            let media = media.trim_matches(['/', '\\']);
            let media = if media.is_empty() {
                "/".to_string()
            } else {
                format!("/{}/", media)
            };
            (format!("{}{}", host, media), media)
        }
        None => (format!("{}media/", base_full), format!("{}media/", base_path)),
    };

    log::debug!("Resolved base URI {} for request {}", base_full, request);

    ResolvedUris {
        request,
        base_full,
        base_host: host,
        base_path,
        route,
        media_full,
        media_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn origin_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("HTTP_HOST", "example.com"),
            ("REQUEST_URI", "/app/index.php/foo"),
            ("PHP_SELF", "/app/index.php"),
            ("SCRIPT_NAME", "/app/index.php"),
        ])
    }

    #[test]
    fn ssl_detection() {
        assert!(!is_ssl_connection(&HashMap::<&str, &str>::new()));
        assert!(is_ssl_connection(&HashMap::from([("HTTPS", "on")])));
        assert!(is_ssl_connection(&HashMap::from([("HTTPS", "1")])));
        assert!(!is_ssl_connection(&HashMap::from([("HTTPS", "OFF")])));
        assert!(is_ssl_connection(&HashMap::from([
            ("HTTPS", "off"),
            ("HTTP_X_FORWARDED_PROTO", "HTTPS"),
        ])));
        assert!(!is_ssl_connection(&HashMap::from([("HTTP_X_FORWARDED_PROTO", "http")])));
    }

    #[test]
    fn origin_server_style_uses_request_uri() {
        assert_eq!(
            detect_request_uri(&origin_env()),
            "http://example.com/app/index.php/foo"
        );
    }

    #[test]
    fn gateway_style_uses_script_name_and_query() {
        let env = HashMap::from([
            ("HTTP_HOST", "example.com"),
            ("SCRIPT_NAME", "/app/index.php"),
            ("QUERY_STRING", "task=view&id=1"),
            ("HTTPS", "on"),
        ]);
        assert_eq!(
            detect_request_uri(&env),
            "https://example.com/app/index.php?task=view&id=1"
        );

        let env = HashMap::from([("HTTP_HOST", "example.com"), ("SCRIPT_NAME", "/run.php")]);
        assert_eq!(detect_request_uri(&env), "http://example.com/run.php");
    }

    #[test]
    fn injection_characters_are_escaped() {
        let env = HashMap::from([
            ("HTTP_HOST", "evil.com\"><script>"),
            ("REQUEST_URI", "/a?b='c' "),
            ("PHP_SELF", "/a"),
        ]);
        assert_eq!(
            detect_request_uri(&env),
            "http://evil.com%22%3E%3Cscript%3E/a?b=%27c%27"
        );
    }

    #[test]
    fn uri_parts_keep_authority_and_path_verbatim() {
        assert_eq!(
            UriParts::parse("http://Example.com:80/a b/page?x=1#top"),
            UriParts {
                prefix: "http://Example.com:80".to_string(),
                path: "/a b/page".to_string(),
            }
        );
        assert_eq!(
            UriParts::parse("http:///app/index.php"),
            UriParts {
                prefix: String::new(),
                path: "/app/index.php".to_string(),
            }
        );
        assert_eq!(
            UriParts::parse("/site/?q"),
            UriParts {
                prefix: String::new(),
                path: "/site/".to_string(),
            }
        );
    }

    #[test]
    fn default_port_stays_in_base_and_route() {
        let mut env = origin_env();
        env.insert("HTTP_HOST", "example.com:80");
        let uris = load_system_uris(&env, &UriOverrides::default());

        assert_eq!(uris.request, "http://example.com:80/app/index.php/foo");
        assert_eq!(uris.base_host, "http://example.com:80");
        assert_eq!(uris.base_full, "http://example.com:80/app/");
        assert_eq!(uris.route.as_deref(), Some("index.php/foo"));
    }

    #[test]
    fn missing_host_gives_empty_prefix() {
        let mut env = origin_env();
        env.remove("HTTP_HOST");
        let uris = load_system_uris(&env, &UriOverrides::default());

        assert_eq!(uris.request, "http:///app/index.php/foo");
        assert_eq!(uris.base_host, "");
        assert_eq!(uris.base_path, "/app/");
        assert_eq!(uris.base_full, "/app/");
        assert_eq!(uris.media_full, "/app/media/");
    }

    #[test]
    fn dirname_matches_posix() {
        assert_eq!(dirname("/app/index.php"), "/app");
        assert_eq!(dirname("/index.php"), "/");
        assert_eq!(dirname("/app/"), "/");
        assert_eq!(dirname("index.php"), ".");
        assert_eq!(dirname("//a//b"), "//a");
        assert_eq!(dirname(""), "");
    }

    #[test]
    fn base_uri_from_script_name() {
        let uris = load_system_uris(&origin_env(), &UriOverrides::default());

        assert_eq!(uris.request, "http://example.com/app/index.php/foo");
        assert_eq!(uris.base_full, "http://example.com/app/");
        assert_eq!(uris.base_host, "http://example.com");
        assert_eq!(uris.base_path, "/app/");
        assert_eq!(uris.route.as_deref(), Some("index.php/foo"));
        assert_eq!(uris.media_full, "http://example.com/app/media/");
        assert_eq!(uris.media_path, "/app/media/");
        assert_eq!(uris.base_full, format!("{}{}", uris.base_host, uris.base_path));
    }

    #[test]
    fn cgi_without_pathinfo_uses_php_self() {
        let mut env = origin_env();
        env.insert("SCRIPT_NAME", "/cgi-bin/php");
        let overrides = UriOverrides {
            cgi_without_pathinfo: true,
            ..Default::default()
        };
        assert_eq!(load_system_uris(&env, &overrides).base_path, "/app/");
        assert_eq!(
            load_system_uris(&env, &UriOverrides::default()).base_path,
            "/cgi-bin/"
        );
    }

    #[test]
    fn explicit_site_uri_wins() {
        let overrides = UriOverrides {
            site_uri: Some("  https://user:pw@cdn.example.org:8443/site/index.php  "),
            ..Default::default()
        };
        let uris = load_system_uris(&origin_env(), &overrides);

        assert_eq!(uris.base_host, "https://user:pw@cdn.example.org:8443");
        assert_eq!(uris.base_path, "/site/");
        assert_eq!(uris.base_full, "https://user:pw@cdn.example.org:8443/site/");
        assert_eq!(uris.route, None);
    }

    #[test]
    fn blank_overrides_count_as_missing() {
        let overrides = UriOverrides {
            request_uri: Some(""),
            site_uri: Some("   "),
            media_uri: Some(""),
            ..Default::default()
        };
        assert_eq!(
            load_system_uris(&origin_env(), &overrides),
            load_system_uris(&origin_env(), &UriOverrides::default())
        );
    }

    #[test]
    fn explicit_request_uri_and_case_insensitive_route() {
        let overrides = UriOverrides {
            request_uri: Some("HTTP://EXAMPLE.COM/App/articles/42"),
            ..Default::default()
        };
        let uris = load_system_uris(&origin_env(), &overrides);

        assert_eq!(uris.request, "HTTP://EXAMPLE.COM/App/articles/42");
        assert_eq!(uris.base_full, "HTTP://EXAMPLE.COM/app/");
        assert_eq!(uris.route.as_deref(), Some("articles/42"));
    }

    #[test]
    fn index_php_is_spliced_out_once() {
        let env = HashMap::from([
            ("HTTP_HOST", "example.com"),
            ("SCRIPT_NAME", "/index.php.d/index.php/run.php"),
        ]);
        let uris = load_system_uris(&env, &UriOverrides::default());
        assert_eq!(uris.base_path, "/.d/index.php/");
    }

    #[test]
    fn media_overrides() {
        let relative = UriOverrides {
            media_uri: Some("\\assets/static/"),
            ..Default::default()
        };
        let uris = load_system_uris(&origin_env(), &relative);
        assert_eq!(uris.media_full, "http://example.com/assets/static/");
        assert_eq!(uris.media_path, "/assets/static/");

        let root = UriOverrides {
            media_uri: Some("//"),
            ..Default::default()
        };
        let uris = load_system_uris(&origin_env(), &root);
        assert_eq!(uris.media_full, "http://example.com/");
        assert_eq!(uris.media_path, "/");

        let absolute = UriOverrides {
            media_uri: Some("https://cdn.example.net/m/"),
            ..Default::default()
        };
        let uris = load_system_uris(&origin_env(), &absolute);
        assert_eq!(uris.media_full, "https://cdn.example.net/m/");
    }

    #[test]
    fn published_entries() {
        let uris = load_system_uris(&origin_env(), &UriOverrides::default());
        assert_eq!(uris.get(URI_BASE_PATH), Some("/app/"));
        assert_eq!(uris.get("uri.unknown"), None);
        assert_eq!(uris.entries().len(), 7);

        let overrides = UriOverrides {
            site_uri: Some("http://other.example/"),
            ..Default::default()
        };
        let uris = load_system_uris(&origin_env(), &overrides);
        assert!(uris.entries().iter().all(|(k, _)| *k != URI_ROUTE));
    }
}
