#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code_num: u16,
    pub message: &'static str,
}

impl Status {
    pub const OK: Status = Status {
        code_num: 200,
        message: "OK",
    };
    pub const MOVED_PERMANENTLY: Status = Status {
        code_num: 301,
        message: "Moved Permanently",
    };
    pub const SEE_OTHER: Status = Status {
        code_num: 303,
        message: "See other",
    };
    pub const NOT_FOUND: Status = Status {
        code_num: 404,
        message: "Not Found",
    };
    pub const INTERNAL_SERVER_ERROR: Status = Status {
        code_num: 500,
        message: "Internal Server Error",
    };
}

const fn s(code_num: u16, message: &'static str) -> Status {
    Status { code_num, message }
}

/// Every status the application knows a reason phrase for, sorted by code.
static STATUSES: &[Status] = &[
    s(100, "Continue"),
    s(101, "Switching Protocols"),
    s(102, "Processing"),
    Status::OK,
    s(201, "Created"),
    s(202, "Accepted"),
    s(203, "Non-Authoritative Information"),
    s(204, "No Content"),
    s(205, "Reset Content"),
    s(206, "Partial Content"),
    s(207, "Multi-Status"),
    s(208, "Already Reported"),
    s(226, "IM Used"),
    s(300, "Multiple Choices"),
    Status::MOVED_PERMANENTLY,
    s(302, "Found"),
    Status::SEE_OTHER,
    s(304, "Not Modified"),
    s(305, "Use Proxy"),
    s(306, "(Unused)"),
    s(307, "Temporary Redirect"),
    s(308, "Permanent Redirect"),
    s(400, "Bad Request"),
    s(401, "Unauthorized"),
    s(402, "Payment Required"),
    s(403, "Forbidden"),
    Status::NOT_FOUND,
    s(405, "Method Not Allowed"),
    s(406, "Not Acceptable"),
    s(407, "Proxy Authentication Required"),
    s(408, "Request Timeout"),
    s(409, "Conflict"),
    s(410, "Gone"),
    s(411, "Length Required"),
    s(412, "Precondition Failed"),
    s(413, "Payload Too Large"),
    s(414, "URI Too Long"),
    s(415, "Unsupported Media Type"),
    s(416, "Range Not Satisfiable"),
    s(417, "Expectation Failed"),
    s(418, "I'm a teapot"),
    s(421, "Misdirected Request"),
    s(422, "Unprocessable Entity"),
    s(423, "Locked"),
    s(424, "Failed Dependency"),
    s(426, "Upgrade Required"),
    s(428, "Precondition Required"),
    s(429, "Too Many Requests"),
    s(431, "Request Header Fields Too Large"),
    s(451, "Unavailable For Legal Reasons"),
    Status::INTERNAL_SERVER_ERROR,
    s(501, "Not Implemented"),
    s(502, "Bad Gateway"),
    s(503, "Service Unavailable"),
    s(504, "Gateway Timeout"),
    s(505, "HTTP Version Not Supported"),
    s(506, "Variant Also Negotiates"),
    s(507, "Insufficient Storage"),
    s(508, "Loop Detected"),
    s(510, "Not Extended"),
    s(511, "Network Authentication Required"),
];

pub const VERSION_PLACEHOLDER: &str = "{version}";

impl Status {
    pub fn find(code: u16) -> Option<Status> {
        STATUSES
            .binary_search_by_key(&code, |status| status.code_num)
            .ok()
            .map(|i| STATUSES[i])
    }

    pub fn all() -> &'static [Status] {
        STATUSES
    }

    /// Status line template with a `{version}` placeholder. Unknown codes get
    /// a bare `HTTP/{version} <code>` line instead of failing.
    pub fn lookup(code: u16) -> String {
        match Self::find(code) {
            Some(status) => format!(
                "HTTP/{} {} {}",
                VERSION_PLACEHOLDER, status.code_num, status.message
            ),
            None => format!("HTTP/{} {}", VERSION_PLACEHOLDER, code),
        }
    }

    pub fn format(code: u16, http_version: &str) -> String {
        Self::lookup(code).replace(VERSION_PLACEHOLDER, http_version)
    }

    pub fn is_known(code: u16) -> bool {
        Self::find(code).is_some()
    }

    pub fn is_redirection(code: u16) -> bool {
        (300..400).contains(&code) && Self::is_known(code)
    }
}
