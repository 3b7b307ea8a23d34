//! HTTP protocol layer module
//!
//! Response builders, caching headers and MIME detection shared by the
//! dispatcher and the transport.

pub mod cache;
pub mod mime;
pub mod response;

pub use response::{
    build_304_response, build_404_response, build_500_response, build_file_response,
    HttpResponse,
};
