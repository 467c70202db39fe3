use crate::dto::HealthRes;
use report_core::report::format_instant;

/// Health service shared by the runner and the standalone REST binary.
///
/// Reports the service as up together with the current time and the deployment environment
/// name the process was started with.
#[derive(Clone, Debug)]
pub struct HealthService {
    environment: String,
}

impl HealthService {
    /// Creates a health service reporting `environment` (for example `development`).
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Static health check for callers that do not hold a service instance.
    pub fn check_health(environment: &str) -> HealthRes {
        HealthRes {
            status: "UP".into(),
            timestamp: format_instant(chrono::Utc::now()),
            environment: environment.into(),
        }
    }

    pub fn check(&self) -> HealthRes {
        Self::check_health(&self.environment)
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new("development")
    }
}
