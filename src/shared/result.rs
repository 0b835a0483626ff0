/// Result type alias used throughout the application
pub type Result<T> = anyhow::Result<T>;
