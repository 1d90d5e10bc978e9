pub mod request;
pub mod responses;
pub mod sink;

pub use request::{ParsedRequest, read_http_request};
pub use sink::{ClientSink, ClientStream, ResponseSink};
