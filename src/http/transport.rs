use std::io::{self, Write};

/// The platform side of a response: where header lines and body bytes go.
pub trait Transport {
    fn headers_sent(&self) -> bool;
    fn connection_alive(&self) -> bool;
    /// Queue one header line. A `code` marks `line` as the status line.
    fn transmit_header(&mut self, line: &str, replace: bool, code: Option<u16>) -> io::Result<()>;
    fn write_body(&mut self, content: &[u8]) -> io::Result<()>;
}

/// Transport over any writer, e.g. stdout for a CGI program.
///
/// Header lines are held back until the first body write or [`flush_headers`],
/// so `replace` can still drop earlier lines of the same name.
///
/// [`flush_headers`]: WriterTransport::flush_headers
pub struct WriterTransport<W: Write> {
    out: W,
    status_line: Option<String>,
    pending: Vec<String>,
    sent: bool,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(out: W) -> Self {
        WriterTransport {
            out,
            status_line: None,
            pending: Vec::new(),
            sent: false,
        }
    }

    pub fn flush_headers(&mut self) -> io::Result<()> {
        if self.sent {
            return Ok(());
        }
        self.sent = true;

        let mut head = Vec::new();
        if let Some(status) = &self.status_line {
            head.extend(format!("{}\r\n", status).as_bytes());
        }
        for line in &self.pending {
            head.extend(format!("{}\r\n", line).as_bytes());
        }
        head.extend("\r\n".as_bytes());

        self.out.write_all(&head)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn header_name(line: &str) -> &str {
    line.split_once(':').map(|(k, _)| k.trim()).unwrap_or(line)
}

impl<W: Write> Transport for WriterTransport<W> {
    fn headers_sent(&self) -> bool {
        self.sent
    }

    fn connection_alive(&self) -> bool {
        true
    }

    fn transmit_header(&mut self, line: &str, replace: bool, code: Option<u16>) -> io::Result<()> {
        if self.sent {
            log::warn!("Header dropped, headers already sent: {}", line);
            return Ok(());
        }
        let line = line.replace('\0', "");

        if code.is_some() {
            self.status_line = Some(line);
            return Ok(());
        }

        if replace {
            let name = header_name(&line).to_string();
            self.pending
                .retain(|l| !header_name(l).eq_ignore_ascii_case(&name));
        }
        self.pending.push(line);
        Ok(())
    }

    fn write_body(&mut self, content: &[u8]) -> io::Result<()> {
        self.flush_headers()?;
        self.out.write_all(content)?;
        self.out.flush()
    }
}
