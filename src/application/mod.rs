/// Application layer - Use cases, DTOs, and the correlation cache
///
/// Coordinates the domain services and the outbound ports. Nothing in this
/// layer touches the network or the filesystem directly.
pub mod correlation_cache;
pub mod dto;
pub mod use_cases;

pub use correlation_cache::CorrelationCache;
