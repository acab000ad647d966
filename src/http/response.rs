use crate::http::body::Body;
use crate::http::headers::HeaderMap;
use crate::http::status::Status;

/// Mutable holder of a response's status, headers and body until it is sent.
pub trait ResponseCarrier {
    fn status(&self) -> u16;
    fn set_status(&mut self, code: u16);
    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn set_body(&mut self, body: Body);

    fn has_header(&self, name: &str) -> bool {
        self.headers().contains(name)
    }

    fn with_added_header(&mut self, name: &str, value: &str) {
        self.headers_mut().append(name, value);
    }

    fn with_replaced_header(&mut self, name: &str, value: &str) {
        self.headers_mut().replace(name, value);
    }

    fn without_header(&mut self, name: &str) {
        self.headers_mut().remove(name);
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Response {
            status: Status::OK.code_num,
            headers: HeaderMap::new(),
            body: Body::memory(),
        }
    }
}

impl Response {
    pub fn from_parts(status: Status, headers: HeaderMap, content: Option<Vec<u8>>) -> Response {
        Response {
            status: status.code_num,
            headers,
            body: content.map(Body::from_bytes).unwrap_or_default(),
        }
    }
}

impl ResponseCarrier for Response {
    fn status(&self) -> u16 {
        self.status
    }

    fn set_status(&mut self, code: u16) {
        self.status = code;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn set_body(&mut self, body: Body) {
        self.body = body;
    }
}

pub fn ok() -> Response {
    Response::default()
}

pub fn not_found() -> Response {
    Response::from_parts(Status::NOT_FOUND, HeaderMap::new(), None)
}
