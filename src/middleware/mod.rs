pub mod response;

pub use response::DmsResponse;
