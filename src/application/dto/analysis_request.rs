/// AnalysisRequest - Internal request DTO for the firmware analysis use case
///
/// Carries the uploaded payload and its declared filename; ingress
/// validation (size cap, extension allow-list) happens inside the use case,
/// before any pipeline stage runs.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Declared filename of the upload, including its extension.
    pub filename: String,
    /// Raw firmware payload.
    pub bytes: Vec<u8>,
    /// Skip vulnerability correlation entirely (offline mode). The report
    /// then carries an empty vulnerability list and is not degraded.
    pub skip_correlation: bool,
}

impl AnalysisRequest {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            skip_correlation: false,
        }
    }

    pub fn offline(mut self) -> Self {
        self.skip_correlation = true;
        self
    }
}
