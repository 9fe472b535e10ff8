//! Request session: line-delimited JSON at the service boundary.
//!
//! Each non-empty input line is one JSON object mapping feature names to
//! numbers. Each response is one JSON line: a rendered `PredictionReport`,
//! or `{"error": {"kind": ..., "message": ...}}`. A failed request never
//! ends the session.

use std::io::{BufRead, Write};

use serde::Serialize;

use crate::application::PredictionService;
use crate::domain::{PredictionError, PredictionReport, RawInputs};
use crate::ports::{Classifier, Scaler};

/// Counts for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub served: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

impl ErrorResponse {
    fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind,
                message: message.into(),
            },
        }
    }
}

impl From<&PredictionError> for ErrorResponse {
    fn from(err: &PredictionError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

fn respond<S, C>(
    service: &PredictionService<S, C>,
    line_no: usize,
    text: &str,
) -> Result<PredictionReport, ErrorResponse>
where
    S: Scaler,
    C: Classifier,
{
    match serde_json::from_str::<RawInputs>(text) {
        Ok(raw) => service.report(&raw).map_err(|e| {
            tracing::warn!(line = line_no, kind = e.kind(), "Request failed: {e}");
            ErrorResponse::from(&e)
        }),
        Err(e) => {
            // Parse errors can quote input text; log only where it failed.
            tracing::warn!(
                line = line_no,
                column = e.column(),
                category = ?e.classify(),
                "Malformed request"
            );
            Err(ErrorResponse::new("invalid_request", e.to_string()))
        }
    }
}

/// Serve requests from `reader` until EOF, writing one response per request.
///
/// # Errors
/// Returns an I/O error only if reading input or writing a response fails.
pub fn serve<S, C, R, W>(
    service: &PredictionService<S, C>,
    reader: R,
    mut writer: W,
) -> std::io::Result<SessionSummary>
where
    S: Scaler,
    C: Classifier,
    R: BufRead,
    W: Write,
{
    let mut summary = SessionSummary::default();

    for (idx, line) in reader.split(b'\n').enumerate() {
        let mut bytes = line?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        let line_no = idx + 1;

        let outcome = match std::str::from_utf8(&bytes) {
            Ok(text) if text.trim().is_empty() => continue,
            Ok(text) => respond(service, line_no, text),
            Err(e) => {
                tracing::warn!(
                    line = line_no,
                    valid_up_to = e.valid_up_to(),
                    "Request is not valid UTF-8"
                );
                Err(ErrorResponse::new(
                    "invalid_request",
                    "request line is not valid UTF-8",
                ))
            }
        };

        match outcome {
            Ok(report) => {
                serde_json::to_writer(&mut writer, &report)?;
                summary.served += 1;
            }
            Err(response) => {
                serde_json::to_writer(&mut writer, &response)?;
                summary.failed += 1;
            }
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    tracing::info!(
        served = summary.served,
        failed = summary.failed,
        "Session finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonArtifactStore;

    const SCENARIO: &str = r#"{"age": 59, "gender": 1, "smoke": 0, "r1": 60.0, "tt1": 10.81, "nl12": 5.01, "f2": 20.19, "r2": 60.92, "nl21": 6.60, "omega_mean21": 31.47}"#;

    fn run(input: &str) -> (SessionSummary, Vec<serde_json::Value>) {
        run_bytes(input.as_bytes())
    }

    fn run_bytes(input: &[u8]) -> (SessionSummary, Vec<serde_json::Value>) {
        let service = PredictionService::from_store(&JsonArtifactStore::new("artifacts"))
            .expect("fixtures should load");
        let mut out = Vec::new();
        let summary = serve(&service, input, &mut out).expect("session io");

        let responses = String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("each response is json"))
            .collect();
        (summary, responses)
    }

    #[test]
    fn test_serves_scenario() {
        let (summary, responses) = run(SCENARIO);

        assert_eq!(summary, SessionSummary { served: 1, failed: 0 });
        assert_eq!(responses[0]["verdict"], "LOW_RISK");
        assert_eq!(responses[0]["guidance"], "recommend routine monitoring");
    }

    #[test]
    fn test_keeps_serving_after_bad_requests() {
        let missing = r#"{"age": 59, "gender": 1}"#;
        let input = format!("{SCENARIO}\nnot json\n\n{missing}\n{SCENARIO}\n");
        let (summary, responses) = run(&input);

        assert_eq!(summary, SessionSummary { served: 2, failed: 2 });
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[1]["error"]["kind"], "invalid_request");
        assert_eq!(responses[2]["error"]["kind"], "missing_feature");
        assert_eq!(responses[0], responses[3]);
    }

    #[test]
    fn test_invalid_utf8_line_is_invalid_request() {
        let mut input = b"{\"age\": \xff}\n".to_vec();
        input.extend_from_slice(SCENARIO.as_bytes());
        input.extend_from_slice(b"\r\n");
        let (summary, responses) = run_bytes(&input);

        assert_eq!(summary, SessionSummary { served: 1, failed: 1 });
        assert_eq!(responses[0]["error"]["kind"], "invalid_request");
        assert_eq!(responses[1]["verdict"], "LOW_RISK");
    }

    #[test]
    fn test_non_numeric_value_is_invalid_request() {
        let (summary, responses) = run(r#"{"age": "fifty-nine"}"#);
        assert_eq!(summary.failed, 1);
        assert_eq!(responses[0]["error"]["kind"], "invalid_request");
    }
}
