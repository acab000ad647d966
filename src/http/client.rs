use crate::http::encoding::{Encoding, parse_accept_encoding};
use crate::http::environment::ServerEnvironment;
use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;

/// Rendering engine of the requesting browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Engine {
    Trident,
    Edge,
    Blink,
    Webkit,
    Gecko,
    Presto,
    Unknown,
}

static TRIDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(MSIE|Trident)\b").unwrap());
static EDGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bEdge/\d").unwrap());
static BLINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(Chrome|CriOS|Edg|OPR)/\d").unwrap());

impl Engine {
    pub fn detect(user_agent: &str) -> Engine {
        if TRIDENT_RE.is_match(user_agent) {
            Engine::Trident
        } else if EDGE_RE.is_match(user_agent) {
            Engine::Edge
        } else if BLINK_RE.is_match(user_agent) {
            Engine::Blink
        } else if user_agent.contains("AppleWebKit") {
            Engine::Webkit
        } else if user_agent.contains("Gecko") {
            Engine::Gecko
        } else if user_agent.contains("Presto") {
            Engine::Presto
        } else {
            Engine::Unknown
        }
    }
}

/// What the request tells us about the client.
#[derive(Debug, Clone, PartialEq)]
pub struct WebClient {
    pub user_agent: String,
    pub engine: Engine,
    pub encodings: Vec<Encoding>,
}

impl WebClient {
    pub fn from_env(env: &impl ServerEnvironment) -> WebClient {
        let user_agent = env.get("HTTP_USER_AGENT");
        let encodings = parse_accept_encoding(&env.get("HTTP_ACCEPT_ENCODING"))
            .into_iter()
            .map(|v| v.encoding)
            .collect();

        WebClient {
            engine: Engine::detect(&user_agent),
            user_agent,
            encodings,
        }
    }
}
