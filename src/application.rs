use crate::config::AppConfig;
use crate::http::assembler::{self, ResponseOptions};
use crate::http::client::WebClient;
use crate::http::compression::{self, Capabilities};
use crate::http::encoding::Encoding;
use crate::http::environment::ServerEnvironment;
use crate::http::error::HttpError;
use crate::http::redirect::{self, RedirectContext, RedirectStatus};
use crate::http::response::{Response, ResponseCarrier};
use crate::http::status::Status;
use crate::http::transport::Transport;
use crate::http::uri::{self, ResolvedUris, UriOverrides};
use bytes::Bytes;
use std::time::SystemTime;

/// One request's worth of response state, plus what was learned about the
/// server and client while setting it up.
pub struct WebApplication<E: ServerEnvironment> {
    config: AppConfig,
    env: E,
    client: WebClient,
    response: Response,
    cacheable: bool,
    uris: ResolvedUris,
    pub modified_date: Option<SystemTime>,
}

impl<E: ServerEnvironment> WebApplication<E> {
    pub fn new(config: AppConfig, env: E) -> Self {
        let client = WebClient::from_env(&env);
        let mut app = WebApplication {
            cacheable: config.cacheable,
            config,
            env,
            client,
            response: Response::default(),
            uris: ResolvedUris::default(),
            modified_date: None,
        };
        app.load_system_uris(None);
        app
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &WebClient {
        &self.client
    }

    pub fn uris(&self) -> &ResolvedUris {
        &self.uris
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    pub fn load_system_uris(&mut self, request_uri: Option<&str>) {
        let overrides = UriOverrides {
            request_uri,
            site_uri: self.config.site_uri.as_deref(),
            media_uri: self.config.media_uri.as_deref(),
            cgi_without_pathinfo: self.config.cgi_without_pathinfo(),
        };
        self.uris = uri::load_system_uris(&self.env, &overrides);
    }

    pub fn is_ssl_connection(&self) -> bool {
        uri::is_ssl_connection(&self.env)
    }

    /// Sets the cacheable flag when given one, and returns the current value.
    pub fn allow_cache(&mut self, allow: Option<bool>) -> bool {
        if let Some(allow) = allow {
            self.cacheable = allow;
        }
        self.cacheable
    }

    pub fn is_valid_http_status(&self, code: u16) -> bool {
        Status::is_known(code)
    }

    pub fn set_header(&mut self, name: &str, value: &str, replace: bool) -> &mut Self {
        assembler::set_header(&mut self.response, name, value, replace);
        self
    }

    pub fn clear_headers(&mut self) -> &mut Self {
        assembler::clear_headers(&mut self.response);
        self
    }

    pub fn get_headers(&self) -> Vec<(String, String)> {
        assembler::get_headers(&self.response)
    }

    pub fn set_body(&mut self, content: impl AsRef<[u8]>) -> &mut Self {
        assembler::set_body(&mut self.response, content);
        self
    }

    pub fn append_body(&mut self, content: impl AsRef<[u8]>) -> Result<&mut Self, HttpError> {
        assembler::append_body(&mut self.response, content)?;
        Ok(self)
    }

    pub fn prepend_body(&mut self, content: impl AsRef<[u8]>) -> Result<&mut Self, HttpError> {
        assembler::prepend_body(&mut self.response, content)?;
        Ok(self)
    }

    pub fn get_body(&self) -> Bytes {
        assembler::get_body(&self.response)
    }

    pub fn compress(&mut self, transport: &impl Transport) -> Option<Encoding> {
        let caps = Capabilities {
            can_transmit_headers: !transport.headers_sent(),
            connection_alive: transport.connection_alive(),
            gzip_capable: true,
        };
        compression::negotiate(&mut self.response, &self.client.encodings, caps)
    }

    pub fn respond(&mut self, transport: &mut impl Transport) -> Result<(), HttpError> {
        let options = ResponseOptions {
            mime_type: &self.config.mime_type,
            charset: &self.config.charset,
            allow_cache: self.cacheable,
            modified_date: self.modified_date,
            http_version: &self.config.http_version,
        };
        assembler::respond(&mut self.response, transport, &options)
    }

    /// Redirects to `url` and sends the response. Nothing more should be
    /// written for this request afterwards.
    pub fn redirect(
        &mut self,
        url: &str,
        status: impl Into<RedirectStatus>,
        transport: &mut impl Transport,
    ) -> Result<(), HttpError> {
        let ctx = RedirectContext {
            headers_sent: transport.headers_sent(),
            engine: self.client.engine,
            charset: &self.config.charset,
            uris: &self.uris,
        };
        let action = redirect::plan(url, &status.into(), &ctx)?;
        redirect::apply(&action, &mut self.response)?;
        self.respond(transport)
    }

    /// Runs `handler`, compresses when enabled and sends the response. A
    /// failing handler is logged and the response goes out as it stands,
    /// with its status set to 500.
    pub fn execute<F>(&mut self, handler: F, transport: &mut impl Transport) -> Result<(), HttpError>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        match handler(self) {
            Ok(()) => {
                if self.config.gzip {
                    self.compress(&*transport);
                }
            }
            Err(e) => {
                log::error!("Request handler failed: {:#}", e);
                self.response.set_status(Status::INTERNAL_SERVER_ERROR.code_num);
            }
        }
        self.respond(transport)
    }

    pub fn status(&self) -> u16 {
        self.response.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::WriterTransport;
    use std::collections::HashMap;

    fn env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("HTTP_HOST", "example.com"),
            ("REQUEST_URI", "/app/index.php/foo"),
            ("PHP_SELF", "/app/index.php"),
            ("SCRIPT_NAME", "/app/index.php"),
            ("HTTP_ACCEPT_ENCODING", "br, gzip"),
        ])
    }

    fn output(transport: WriterTransport<Vec<u8>>) -> Vec<u8> {
        transport.into_inner()
    }

    #[test]
    fn uris_are_loaded_on_construction() {
        let app = WebApplication::new(AppConfig::default(), env());
        assert_eq!(app.uris().base_full, "http://example.com/app/");
        assert!(!app.is_ssl_connection());
    }

    #[test]
    fn reload_with_explicit_request_uri() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        app.load_system_uris(Some("http://example.com/app/blog/1"));
        assert_eq!(app.uris().route.as_deref(), Some("blog/1"));
    }

    #[test]
    fn cache_flag_and_status_checks() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        assert!(app.allow_cache(None));
        assert!(!app.allow_cache(Some(false)));
        assert!(!app.allow_cache(None));
        assert!(app.is_valid_http_status(451));
        assert!(!app.is_valid_http_status(299));
    }

    #[test]
    fn uncachable_response_never_expires_in_future() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        app.allow_cache(Some(false));
        app.set_body("hello");
        let mut transport = WriterTransport::new(Vec::new());
        app.respond(&mut transport).unwrap();

        let out = String::from_utf8(output(transport)).unwrap();
        assert!(out.contains("Cache-Control: no-store"));
        assert!(out.contains("Expires: Wed, 17 Aug 2005 00:00:00 GMT\r\n"));
        assert!(out.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn execute_compresses_when_enabled() {
        let config = AppConfig {
            gzip: true,
            ..AppConfig::default()
        };
        let mut app = WebApplication::new(config, env());
        let mut transport = WriterTransport::new(Vec::new());
        let text = "lorem ipsum ".repeat(100);

        app.execute(
            |app| {
                app.set_body(&text).set_header("X-Handler", "yes", false);
                Ok(())
            },
            &mut transport,
        )
        .unwrap();

        assert_eq!(app.response().headers.get("Content-Encoding"), Some("gzip"));
        let out = output(transport);
        assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(out.len() < text.len());
    }

    #[test]
    fn failing_handler_answers_500() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        let mut transport = WriterTransport::new(Vec::new());

        app.execute(|_| Err(anyhow::anyhow!("boom")), &mut transport)
            .unwrap();

        assert_eq!(app.status(), 500);
        let out = String::from_utf8(output(transport)).unwrap();
        assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[test]
    fn failing_handler_keeps_what_it_set() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        let mut transport = WriterTransport::new(Vec::new());

        app.execute(
            |app| {
                app.set_header("X-Trace", "abc", false).set_body("partial");
                Err(anyhow::anyhow!("boom"))
            },
            &mut transport,
        )
        .unwrap();

        assert_eq!(app.status(), 500);
        let out = String::from_utf8(output(transport)).unwrap();
        assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(out.contains("X-Trace: abc\r\n"));
        assert!(out.ends_with("partial"));
    }

    #[test]
    fn redirect_sends_location() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        let mut transport = WriterTransport::new(Vec::new());

        app.redirect("index.php?task=x", 303u16, &mut transport).unwrap();

        let out = String::from_utf8(output(transport)).unwrap();
        assert!(out.starts_with("HTTP/1.1 303 See other\r\n"));
        assert!(out.contains("Location: http://example.com/app/index.php?task=x\r\n"));
    }

    #[test]
    fn redirect_rejects_bad_status_without_touching_response() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        let mut transport = WriterTransport::new(Vec::new());

        let err = app.redirect("/x", "200", &mut transport).unwrap_err();

        assert!(matches!(err, HttpError::InvalidRedirectStatus(_)));
        assert!(app.get_headers().is_empty());
        assert!(!transport.headers_sent());
    }

    #[test]
    fn body_helpers_chain() {
        let mut app = WebApplication::new(AppConfig::default(), env());
        app.set_body("b");
        app.append_body("c").unwrap().prepend_body("a").unwrap();
        assert_eq!(&app.get_body()[..], b"abc");
        app.set_header("A", "1", false).clear_headers();
        assert!(app.get_headers().is_empty());
    }
}
