use std::time::Duration;

use serde_json::Value;

use crate::config::ExtractionConfig;
use crate::content::ContentItem;
use crate::error::ExtractionError;
use crate::normalize::normalize;
use crate::schema::ContentKind;

/// Bound for the quick control-plane calls (job submit, status query). The
/// synchronous extraction path uses the configured `sync_timeout` instead.
pub(crate) const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the external extraction service. All extraction state lives on
/// the service side; this type only holds read-only connection settings.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ExtractionConfig,
}

/// Opaque reference to a job running on the extraction service, together
/// with the content kind the caller requested (needed to normalize the
/// payload once the job completes).
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
    pub kind: ContentKind,
}

/// Outcome of a job submission. Small or fast pages may finish before the
/// service replies, in which case the result arrives inline.
#[derive(Debug)]
pub enum JobStart {
    Accepted(JobHandle),
    Completed(ContentItem),
}

impl ExtractionClient {
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ExtractionError::Config(format!("build http client: {err}")))?;
        Ok(Self { http, config })
    }

    /// Blocking extraction: submits the URL plus the kind's schema and waits
    /// for the structured result, bounded by the configured sync timeout.
    pub async fn extract(
        &self,
        url: &str,
        kind: ContentKind,
    ) -> Result<ContentItem, ExtractionError> {
        let url = validate_target_url(url)?;
        let schema = kind.schema();
        tracing::info!(target_url = %url, schema = schema.name, "requesting synchronous extraction");

        let request = self
            .http
            .post(self.endpoint("/api/v1/extract"))
            .json(&serde_json::json!({ "url": url, "schema": schema.body }));
        let response = self.send(request, self.config.sync_timeout).await?;
        let payload = success_payload(response).await?;
        reject_embedded_error(&payload)?;

        Ok(normalize(kind, data_envelope(&payload)))
    }

    /// Fire-and-forget submission. Returns immediately with a job handle, or
    /// with the finished result when the service completed before replying.
    /// Merge mode folds multi-page crawl results into one document.
    pub async fn start_job(
        &self,
        url: &str,
        kind: ContentKind,
    ) -> Result<JobStart, ExtractionError> {
        let url = validate_target_url(url)?;
        let schema = kind.schema();
        tracing::info!(target_url = %url, schema = schema.name, "submitting extraction job");

        let request = self
            .http
            .post(self.endpoint("/api/v1/extract/start"))
            .json(&serde_json::json!({ "url": url, "schema": schema.body, "merge": true }));
        let response = self.send(request, CONTROL_TIMEOUT).await?;
        let payload = success_payload(response).await?;
        reject_embedded_error(&payload)?;

        if payload.get("status").and_then(Value::as_str) == Some("completed") {
            return Ok(JobStart::Completed(normalize(
                kind,
                data_envelope(&payload),
            )));
        }

        let job_id = payload
            .get("job_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ExtractionError::upstream(None, "extraction service response carries no job_id")
            })?;

        tracing::info!(job_id, "extraction job accepted");
        Ok(JobStart::Accepted(JobHandle {
            job_id: job_id.to_string(),
            kind,
        }))
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, ExtractionError> {
        let mut request = request.bearer_auth(&self.config.api_key).timeout(timeout);
        if let Some(referer) = &self.config.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }

        request.send().await.map_err(|err| {
            if err.is_timeout() {
                ExtractionError::Timeout(timeout)
            } else {
                ExtractionError::upstream(None, format!("extraction request failed: {err}"))
            }
        })
    }
}

/// Converts a response into its JSON payload, mapping credential rejections
/// and non-success statuses into the error taxonomy.
pub(crate) async fn success_payload(
    response: reqwest::Response,
) -> Result<Value, ExtractionError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ExtractionError::Auth);
    }

    let raw = response.text().await.map_err(|err| {
        ExtractionError::upstream(Some(status.as_u16()), format!("read response body: {err}"))
    })?;

    if !status.is_success() {
        let message = parse_error_message(&raw)
            .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
        return Err(ExtractionError::upstream(Some(status.as_u16()), message));
    }

    serde_json::from_str(&raw).map_err(|err| {
        ExtractionError::upstream(
            Some(status.as_u16()),
            format!("extraction service returned invalid JSON: {err}"),
        )
    })
}

/// A 2xx submit/extract body carrying a non-empty `error` field is still an
/// upstream failure with that message. Job status bodies use `error` for the
/// job's own failure message instead and must not go through this check.
fn reject_embedded_error(payload: &Value) -> Result<(), ExtractionError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        let message = message.trim();
        if !message.is_empty() {
            return Err(ExtractionError::upstream(None, message));
        }
    }
    Ok(())
}

fn parse_error_message(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let message = value.get("error")?.as_str()?.trim();
    if message.is_empty() {
        return None;
    }
    Some(message.to_string())
}

/// Some deployments wrap the extracted document in a `data` envelope, others
/// return it bare.
pub(crate) fn data_envelope(payload: &Value) -> &Value {
    match payload.get("data") {
        Some(data) if !data.is_null() => data,
        _ => payload,
    }
}

fn validate_target_url(raw: &str) -> Result<&str, ExtractionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ExtractionError::Validation("URL is required".to_string()));
    }

    let parsed = url::Url::parse(raw)
        .map_err(|err| ExtractionError::Validation(format!("invalid URL: {err}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ExtractionError::Validation(
            "URL must be http or https".to_string(),
        ));
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{data_envelope, validate_target_url};
    use crate::error::ExtractionError;

    #[test]
    fn data_envelope_unwraps_only_when_present() {
        let wrapped = json!({"data": {"title": "t"}});
        assert_eq!(data_envelope(&wrapped), &json!({"title": "t"}));

        let bare = json!({"title": "t"});
        assert_eq!(data_envelope(&bare), &bare);

        let null_data = json!({"data": null, "title": "t"});
        assert_eq!(data_envelope(&null_data), &null_data);
    }

    #[test]
    fn target_urls_are_validated_before_any_network_io() {
        assert!(matches!(
            validate_target_url("  "),
            Err(ExtractionError::Validation(_))
        ));
        assert!(matches!(
            validate_target_url("ftp://example.test/guide"),
            Err(ExtractionError::Validation(_))
        ));
        assert!(validate_target_url("https://example.test/guide").is_ok());
    }
}
