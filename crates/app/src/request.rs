//! JSON-lines command protocol spoken by the binary.
//!
//! Each input line is one object tagged by `command`:
//!
//! ```json
//! {"command": "IssueMerch", "email": "iivanov@mail.com", "first_name": "Ivan",
//!  "last_name": "Ivanov", "merch_pack_type_id": 10, "from_type_id": 2}
//! ```
//!
//! `{"command": "Metrics"}` returns the Prometheus text exposition of every
//! recorded metric as a string.
//!
//! Each output line is either `{"ok": <result>}` or
//! `{"error": <message>, "kind": <classification>}`.

use application::{
    CancelMerchRequest, GetIssuedMerchPacks, IssueMerch, MerchService, ProcessSupplyArrived,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use storage::CancellationToken;

use crate::error::AppError;

/// One command read from the input stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Request {
    IssueMerch(IssueMerch),
    ProcessSupplyArrived(ProcessSupplyArrived),
    CancelMerchRequest(CancelMerchRequest),
    GetIssuedMerchPacks(GetIssuedMerchPacks),
    Metrics,
}

/// Runs `request` through its pipeline and serializes the outcome.
///
/// `metrics` answers [`Request::Metrics`]; without it that request fails.
pub async fn dispatch(
    service: &MerchService,
    metrics: Option<&PrometheusHandle>,
    request: Request,
    cancel: &CancellationToken,
) -> Result<Value, AppError> {
    let value = match request {
        Request::IssueMerch(command) => {
            serde_json::to_value(service.issue_merch(command, cancel).await?)?
        }
        Request::ProcessSupplyArrived(command) => {
            serde_json::to_value(service.process_supply_arrived(command, cancel).await?)?
        }
        Request::CancelMerchRequest(command) => {
            serde_json::to_value(service.cancel_merch_request(command, cancel).await?)?
        }
        Request::GetIssuedMerchPacks(command) => {
            serde_json::to_value(service.get_issued_merch_packs(command, cancel).await?)?
        }
        Request::Metrics => Value::String(metrics.ok_or(AppError::MetricsUnavailable)?.render()),
    };
    Ok(value)
}

/// Parses and executes one input line, always producing a response line.
pub async fn handle_line(
    service: &MerchService,
    metrics: Option<&PrometheusHandle>,
    line: &str,
    cancel: &CancellationToken,
) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable request");
            return json!({ "error": e.to_string(), "kind": "Malformed" });
        }
    };

    match dispatch(service, metrics, request, cancel).await {
        Ok(value) => json!({ "ok": value }),
        Err(e) => {
            let kind = e
                .kind()
                .map_or_else(|| "Internal".to_string(), |kind| format!("{kind:?}"));
            json!({ "error": e.to_string(), "kind": kind })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_command() {
        let request: Request = serde_json::from_str(
            r#"{"command": "CancelMerchRequest", "email": "ppetrov@mail.com", "merch_pack_type_id": 20}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            Request::CancelMerchRequest(CancelMerchRequest {
                email: "ppetrov@mail.com".to_string(),
                merch_pack_type_id: 20,
            })
        );
    }

    #[test]
    fn parses_metrics_command() {
        let request: Request = serde_json::from_str(r#"{"command": "Metrics"}"#).unwrap();
        assert_eq!(request, Request::Metrics);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result = serde_json::from_str::<Request>(r#"{"command": "DeleteEverything"}"#);
        assert!(result.is_err());
    }
}
