/// Network adapters - External API clients
pub mod nvd_client;

pub use nvd_client::NvdClient;
