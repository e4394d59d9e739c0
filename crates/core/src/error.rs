#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),

    #[error("parameter '{name}' is not declared by report '{report_uuid}'")]
    UnknownParameter { report_uuid: String, name: String },
    #[error("no report is selected")]
    NoReportSelected,
    #[error("form is not valid for submission")]
    FormInvalid,
    #[error("a run-report request is already in flight")]
    SubmissionInFlight,
    #[error("form has been torn down")]
    TornDown,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server rejected the request with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("OpenMRS wire error: {0}")]
    Wire(#[from] openmrs::OpenmrsError),
}

impl ReportError {
    /// Text to show under a failure notification.
    ///
    /// A rejection carries the server's own message when it sent one; every other error
    /// describes itself.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ReportError::Rejected { message, .. } => message.clone(),
            other => Some(other.to_string()),
        }
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
