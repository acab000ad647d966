use crate::http::body::Body;
use crate::http::error::HttpError;
use crate::http::response::ResponseCarrier;
use crate::http::status::Status;
use crate::http::transport::Transport;
use bytes::Bytes;
use std::time::{Duration, SystemTime};

/// Expiry date sent with uncachable responses.
pub const EXPIRED_DATE: &str = "Wed, 17 Aug 2005 00:00:00 GMT";
pub const NO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, post-check=0, pre-check=0";
pub const CACHE_LIFETIME: Duration = Duration::from_secs(900);

/// Settings that shape the final header set of a response.
#[derive(Debug, Clone)]
pub struct ResponseOptions<'a> {
    pub mime_type: &'a str,
    pub charset: &'a str,
    pub allow_cache: bool,
    pub modified_date: Option<SystemTime>,
    pub http_version: &'a str,
}

pub fn set_header(carrier: &mut impl ResponseCarrier, name: &str, value: &str, replace: bool) {
    if replace {
        carrier.with_replaced_header(name, value);
    } else {
        carrier.with_added_header(name, value);
    }
}

/// Appends `value` unless `name` already carries exactly that value.
fn ensure_header_value(carrier: &mut impl ResponseCarrier, name: &str, value: &str) {
    if !carrier.headers().get_all(name).iter().any(|v| v == value) {
        carrier.with_added_header(name, value);
    }
}

pub fn clear_headers(carrier: &mut impl ResponseCarrier) {
    carrier.headers_mut().clear();
}

pub fn get_headers(carrier: &impl ResponseCarrier) -> Vec<(String, String)> {
    carrier.headers().flatten()
}

pub fn set_body(carrier: &mut impl ResponseCarrier, content: impl AsRef<[u8]>) {
    carrier.set_body(Body::from_bytes(content));
}

pub fn get_body(carrier: &impl ResponseCarrier) -> Bytes {
    carrier.body().contents()
}

pub fn prepend_body(
    carrier: &mut impl ResponseCarrier,
    content: impl AsRef<[u8]>,
) -> Result<(), HttpError> {
    let current = carrier.body();
    if !current.is_readable() {
        return Err(HttpError::UnableToWriteBody);
    }

    let mut body = Body::from_bytes(content);
    body.write(&current.contents())?;
    carrier.set_body(body);
    Ok(())
}

pub fn append_body(
    carrier: &mut impl ResponseCarrier,
    content: impl AsRef<[u8]>,
) -> Result<(), HttpError> {
    let current = carrier.body();
    if current.is_writable() {
        carrier.body_mut().write(content.as_ref())?;
    } else if current.is_readable() {
        let mut body = Body::from_bytes(current.contents());
        body.write(content.as_ref())?;
        carrier.set_body(body);
    } else {
        return Err(HttpError::UnableToWriteBody);
    }
    Ok(())
}

pub fn prepare_for_transmission(carrier: &mut impl ResponseCarrier, options: &ResponseOptions) {
    prepare_for_transmission_at(carrier, options, SystemTime::now());
}

/// Fills in every default header the response still lacks. Steps run in a
/// fixed order so later ones see the defaults of earlier ones.
pub fn prepare_for_transmission_at(
    carrier: &mut impl ResponseCarrier,
    options: &ResponseOptions,
    now: SystemTime,
) {
    if !carrier.has_header("Content-Type") {
        let content_type = format!("{}; charset={}", options.mime_type, options.charset);
        set_header(carrier, "Content-Type", &content_type, false);
    }

    if !options.allow_cache {
        set_header(carrier, "Expires", EXPIRED_DATE, true);
        set_header(carrier, "Last-Modified", &httpdate::fmt_http_date(now), true);
        ensure_header_value(carrier, "Cache-Control", NO_CACHE_CONTROL);
        ensure_header_value(carrier, "Pragma", "no-cache");
    } else {
        if !carrier.has_header("Expires") {
            let expires = httpdate::fmt_http_date(now + CACHE_LIFETIME);
            set_header(carrier, "Expires", &expires, false);
        }
        if let Some(modified) = options.modified_date {
            if !carrier.has_header("Last-Modified") {
                set_header(carrier, "Last-Modified", &httpdate::fmt_http_date(modified), false);
            }
        }
    }

    if !carrier.has_header("Status") {
        let status = carrier.status().to_string();
        set_header(carrier, "Status", &status, false);
    }
}

/// Status line for a `Status` header value, plus the code to hand the
/// transport. Codes that do not fit a `u16` keep their digits in the line and
/// go out as code 0.
fn status_line(value: &str, http_version: &str) -> (String, u16) {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return (Status::format(0, http_version), 0);
    }
    match digits.parse::<u16>() {
        Ok(code) => (Status::format(code, http_version), code),
        Err(_) => (format!("HTTP/{} {}", http_version, digits), 0),
    }
}

pub fn send_headers(
    carrier: &impl ResponseCarrier,
    transport: &mut impl Transport,
    http_version: &str,
) -> Result<(), HttpError> {
    if transport.headers_sent() {
        log::warn!("Headers already sent, skipping {} headers", carrier.headers().len());
        return Ok(());
    }

    for (name, value) in get_headers(carrier) {
        if name.eq_ignore_ascii_case("status") {
            let (line, code) = status_line(&value, http_version);
            transport.transmit_header(&line, true, Some(code))?;
        } else {
            transport.transmit_header(&format!("{}: {}", name, value), false, None)?;
        }
    }
    Ok(())
}

/// Fills defaults, sends the headers, then writes the body.
pub fn respond(
    carrier: &mut impl ResponseCarrier,
    transport: &mut impl Transport,
    options: &ResponseOptions,
) -> Result<(), HttpError> {
    prepare_for_transmission(carrier, options);
    send_headers(carrier, transport, options.http_version)?;
    transport.write_body(&get_body(carrier))?;
    Ok(())
}
