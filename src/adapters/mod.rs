/// Adapters layer - Infrastructure implementations
pub mod outbound;
