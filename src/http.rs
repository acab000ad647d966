pub mod assembler;
pub mod body;
pub mod client;
pub mod compression;
pub mod encoding;
pub mod environment;
pub mod error;
pub mod headers;
pub mod redirect;
pub mod response;
pub mod status;
pub mod transport;
pub mod uri;

pub use error::HttpError;
pub use redirect::is_ascii;
pub use response::{Response, ResponseCarrier, not_found, ok};
pub use status::Status;
