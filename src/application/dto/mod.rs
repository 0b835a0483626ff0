/// Data Transfer Objects for the application layer
pub mod analysis_request;
pub mod analysis_response;

pub use analysis_request::AnalysisRequest;
pub use analysis_response::{AnalysisResponse, ComponentView};
