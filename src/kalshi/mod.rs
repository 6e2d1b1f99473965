mod client;
mod transport;

pub use client::KalshiClient;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
