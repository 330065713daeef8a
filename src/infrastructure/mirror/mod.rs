//! Remote history mirror adapters

mod http;

pub use http::{HttpHistoryMirror, MIRROR_PATH};
