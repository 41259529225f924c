//! Component health report.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EvokeResult;

/// Overall status: `ok` only if every component is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// Per-component status lines plus the overall verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub services: BTreeMap<String, String>,
}

impl HealthReport {
    pub(crate) fn new() -> Self {
        Self {
            status: HealthStatus::Ok,
            services: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, component: &str, outcome: Result<String, String>) {
        let line = match outcome {
            Ok(detail) => detail,
            Err(reason) => {
                self.status = HealthStatus::Degraded;
                format!("error: {}", reason)
            }
        };
        self.services.insert(component.to_string(), line);
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}

/// Run one probe under `timeout`, flattening errors to a message.
pub(crate) async fn probe<T, F>(timeout: Duration, fut: F) -> Result<T, String>
where
    F: Future<Output = EvokeResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("no response within {}ms", timeout.as_millis())),
    }
}
