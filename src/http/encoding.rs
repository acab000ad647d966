use once_cell::sync::Lazy;
use regex::Regex;
use strum::{Display, EnumString, IntoStaticStr};

#[derive(EnumString, IntoStaticStr, Debug, PartialEq, Eq, Hash, Clone, Copy, Display)]
#[strum(ascii_case_insensitive)]
pub enum Encoding {
    #[strum(serialize = "gzip")]
    Gzip,
    #[strum(serialize = "x-gzip")]
    XGzip,
    #[strum(serialize = "compress")]
    Compress,
    #[strum(serialize = "deflate")]
    Deflate,
    #[strum(serialize = "br")]
    Br,
    #[strum(serialize = "zstd")]
    Zstd,
    #[strum(serialize = "dcb")]
    Dcb,
    #[strum(serialize = "dcz")]
    Dcz,

    #[strum(serialize = "identity")]
    Identity,
    #[strum(serialize = "*")]
    Any,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct EncodingVal {
    pub encoding: Encoding,
    pub quality: f32,
}

static ACCEPT_ENCODING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<enc>[\w*\-]+)(?:\s*;\s*q=(?P<q>0(\.\d+)?|1(\.0+)?))?").unwrap());

/// Encodings the client accepts, most preferred first.
///
/// Ties keep header order, `q=0` entries are refused encodings and dropped,
/// and tokens this crate has no name for are skipped.
pub fn parse_accept_encoding(header: &str) -> Vec<EncodingVal> {
    let mut encodings: Vec<EncodingVal> = ACCEPT_ENCODING_RE
        .captures_iter(header)
        .filter_map(|cap| {
            let token = cap.name("enc")?.as_str();
            let encoding = match Encoding::try_from(token) {
                Ok(encoding) => encoding,
                Err(_) => {
                    log::debug!("Ignoring unknown content coding {:?}", token);
                    return None;
                }
            };

            let quality = cap
                .name("q")
                .and_then(|m| m.as_str().parse::<f32>().ok())
                .unwrap_or(1.0);

            Some(EncodingVal { encoding, quality })
        })
        .filter(|val| val.quality > 0.0)
        .collect();

    encodings.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    encodings
}
