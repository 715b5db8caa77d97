use crate::domain::QueryParams;

/// Context for a failed request, handed to the diagnostics collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub service: &'static str,
    pub method: &'static str,
    pub url: String,
    /// Request parameters without the API key.
    pub params: QueryParams,
    pub status: Option<u16>,
    pub message: String,
}

pub trait Diagnostics: Send + Sync {
    fn report(&self, report: &ErrorReport);
}

/// Emits failed requests as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, report: &ErrorReport) {
        tracing::error!(
            service = report.service,
            method = report.method,
            url = %report.url,
            params = %report.params,
            status = ?report.status,
            "Request failed: {}",
            report.message
        );
    }
}
