pub mod error;
pub mod result;

pub use error::{AnalysisError, ExitCode, IngestError, Stage};
pub use result::Result;
