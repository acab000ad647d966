use crate::http::assembler::{get_body, set_body, set_header};
use crate::http::encoding::Encoding;
use crate::http::response::ResponseCarrier;
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};
use std::io::{self, Write};

/// zlib level 4: noticeably faster than the default at a small cost in ratio.
pub const COMPRESSION_LEVEL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Gzip,
    Deflate,
}

/// Transport and platform facts the negotiation depends on.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub can_transmit_headers: bool,
    pub connection_alive: bool,
    pub gzip_capable: bool,
}

fn supported(encoding: Encoding) -> Option<Scheme> {
    match encoding {
        Encoding::XGzip | Encoding::Gzip => Some(Scheme::Gzip),
        Encoding::Deflate => Some(Scheme::Deflate),
        _ => None,
    }
}

pub fn compress(data: &[u8], scheme: Scheme) -> io::Result<Vec<u8>> {
    let level = Compression::new(COMPRESSION_LEVEL);
    match scheme {
        Scheme::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(data)?;
            encoder.finish()
        }
        Scheme::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Compresses the body with the first client encoding that works.
///
/// Returns the encoding that was applied, or `None` when the response was
/// left untouched.
pub fn negotiate(
    carrier: &mut impl ResponseCarrier,
    client_encodings: &[Encoding],
    caps: Capabilities,
) -> Option<Encoding> {
    let candidates: Vec<(Encoding, Scheme)> = client_encodings
        .iter()
        .filter_map(|&enc| supported(enc).map(|scheme| (enc, scheme)))
        .collect();

    if candidates.is_empty() {
        return None;
    }
    if !caps.can_transmit_headers || !caps.connection_alive || !caps.gzip_capable {
        log::debug!("Skipping compression, transport cannot carry it: {:?}", caps);
        return None;
    }

    let data = get_body(carrier);
    for (encoding, scheme) in candidates {
        let compressed = match compress(&data, scheme) {
            Ok(compressed) => compressed,
            Err(e) => {
                log::warn!("{} compression failed, trying next encoding: {}", encoding, e);
                continue;
            }
        };

        log::debug!(
            "Compressed body with {}: {} -> {} bytes",
            encoding,
            data.len(),
            compressed.len()
        );
        let token: &'static str = encoding.into();
        set_header(carrier, "Content-Encoding", token, true);
        set_header(carrier, "Vary", "Accept-Encoding", false);
        set_body(carrier, compressed);
        return Some(encoding);
    }

    None
}
