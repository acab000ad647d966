use crate::http::assembler::{append_body, set_body, set_header};
use crate::http::client::Engine;
use crate::http::error::HttpError;
use crate::http::response::ResponseCarrier;
use crate::http::status::Status;
use crate::http::uri::{ResolvedUris, UriParts};
use once_cell::sync::Lazy;
use regex::Regex;

static FRONT_CONTROLLER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^index\.php").unwrap());
static SCHEME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z]+://").unwrap());

pub fn is_ascii(s: &str) -> bool {
    s.is_ascii()
}

/// Status argument of a redirect.
///
/// Booleans are the old calling convention: `true` meant permanent (301),
/// `false` see-other (303).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectStatus {
    Code(u16),
    Legacy(bool),
    Text(String),
}

impl Default for RedirectStatus {
    fn default() -> Self {
        RedirectStatus::Code(Status::SEE_OTHER.code_num)
    }
}

impl From<u16> for RedirectStatus {
    fn from(code: u16) -> Self {
        RedirectStatus::Code(code)
    }
}

impl From<bool> for RedirectStatus {
    fn from(permanent: bool) -> Self {
        RedirectStatus::Legacy(permanent)
    }
}

impl From<&str> for RedirectStatus {
    fn from(text: &str) -> Self {
        RedirectStatus::Text(text.to_string())
    }
}

impl RedirectStatus {
    pub fn resolve(&self) -> Result<u16, HttpError> {
        match self {
            RedirectStatus::Code(code) => Ok(*code),
            RedirectStatus::Legacy(true) => Ok(Status::MOVED_PERMANENTLY.code_num),
            RedirectStatus::Legacy(false) => Ok(Status::SEE_OTHER.code_num),
            RedirectStatus::Text(text) => text
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|code| Status::is_redirection(*code))
                .ok_or_else(|| HttpError::InvalidRedirectStatus(text.clone())),
        }
    }
}

/// What the planner needs to know about the request being answered.
#[derive(Debug, Clone, Copy)]
pub struct RedirectContext<'a> {
    pub headers_sent: bool,
    pub engine: Engine,
    pub charset: &'a str,
    pub uris: &'a ResolvedUris,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectAction {
    /// `Status` and `Location` headers.
    Header { status: u16, location: String },
    /// Headers are gone already, navigate from a script in the body.
    Script { location: String },
    /// Trident mangles non-ASCII `Location` headers, so it gets a small
    /// document that navigates by script.
    // TODO: drop once no supported client still runs a Trident engine.
    LegacyDocument { location: String, charset: String },
}

impl RedirectAction {
    pub fn location(&self) -> &str {
        match self {
            RedirectAction::Header { location, .. }
            | RedirectAction::Script { location }
            | RedirectAction::LegacyDocument { location, .. } => location,
        }
    }
}

/// JSON string literal that is safe to embed in a `<script>` element of
/// any page charset: slashes escaped, everything past ASCII as `\uXXXX`.
fn script_literal(url: &str) -> String {
    let quoted = serde_json::Value::from(url).to_string();
    let mut out = String::with_capacity(quoted.len());
    for c in quoted.chars() {
        match c {
            '/' => out.push_str("\\/"),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out
}

fn navigation_script(url: &str) -> String {
    format!("<script>document.location.href={};</script>", script_literal(url))
}

/// Absolute form of a redirect target, resolved against the request.
pub fn resolve_target(target: &str, uris: &ResolvedUris) -> String {
    let target = if FRONT_CONTROLLER_RE.is_match(target) {
        format!("{}{}", uris.base_full, target)
    } else {
        target.to_string()
    };

    // Anything after a line break would end up as extra header lines.
    let target = target.split(['\r', '\n']).next().unwrap_or_default();

    if SCHEME_RE.is_match(target) {
        return target.to_string();
    }

    let request = UriParts::parse(&uris.request);
    if target.starts_with('/') {
        format!("{}{}", request.prefix, target)
    } else {
        let dir = match request.path.rfind('/') {
            Some(i) => &request.path[..=i],
            None => "/",
        };
        format!("{}{}{}", request.prefix, dir, target)
    }
}

pub fn plan(
    target: &str,
    status: &RedirectStatus,
    ctx: &RedirectContext,
) -> Result<RedirectAction, HttpError> {
    let status = status.resolve()?;
    let location = resolve_target(target, ctx.uris);

    let action = if ctx.headers_sent {
        RedirectAction::Script { location }
    } else if ctx.engine == Engine::Trident && !is_ascii(&location) {
        RedirectAction::LegacyDocument {
            location,
            charset: ctx.charset.to_string(),
        }
    } else {
        RedirectAction::Header { status, location }
    };

    log::debug!("Redirect planned: {:?}", action);
    Ok(action)
}

/// Writes the action into the response. The caller still has to prepare and
/// send the response afterwards.
pub fn apply(action: &RedirectAction, carrier: &mut impl ResponseCarrier) -> Result<(), HttpError> {
    match action {
        RedirectAction::Header { status, location } => {
            set_header(carrier, "Status", &status.to_string(), true);
            set_header(carrier, "Location", location, true);
        }
        RedirectAction::Script { location } => {
            append_body(carrier, format!("{}\n", navigation_script(location)))?;
        }
        RedirectAction::LegacyDocument { location, charset } => {
            let html = format!(
                "<html><head><meta http-equiv=\"content-type\" content=\"text/html; charset={}\" />{}</head><body></body></html>",
                charset,
                navigation_script(location)
            );
            set_body(carrier, html);
        }
    }
    Ok(())
}
