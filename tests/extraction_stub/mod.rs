use std::io::Read as _;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone)]
pub enum PollReply {
    NotFound,
    Body(Value),
}

#[derive(Debug, Clone)]
pub struct ExtractionStubConfig {
    pub expected_bearer: String,
    /// Response for `POST /api/v1/extract` as (status, body).
    pub extract_response: Option<(u16, Value)>,
    /// Response for `POST /api/v1/extract/start` as (status, body).
    pub start_response: Option<(u16, Value)>,
    /// Responses for `GET /api/v1/jobs/{id}`, consumed in order; the last
    /// one repeats for every further poll.
    pub poll_replies: Vec<PollReply>,
}

impl Default for ExtractionStubConfig {
    fn default() -> Self {
        Self {
            expected_bearer: "test-key".to_string(),
            extract_response: None,
            start_response: None,
            poll_replies: Vec::new(),
        }
    }
}

pub struct ExtractionStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ExtractionStub {
    pub fn spawn(config: ExtractionStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start extraction stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut poll_index = 0usize;

            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let authorized = request.headers().iter().any(|header| {
                    header.field.equiv("Authorization")
                        && header.value.as_str() == format!("Bearer {}", config.expected_bearer)
                });
                if !authorized {
                    respond_json(request, 401, &serde_json::json!({"error": "invalid api key"}));
                    continue;
                }

                let path = request.url().to_string();
                let is_post = request.method() == &tiny_http::Method::Post;

                if is_post && (path == "/api/v1/extract" || path == "/api/v1/extract/start") {
                    let mut body = String::new();
                    if request.as_reader().read_to_string(&mut body).is_err() {
                        respond_json(
                            request,
                            400,
                            &serde_json::json!({"error": "invalid request body"}),
                        );
                        continue;
                    }
                    let parsed: Value = match serde_json::from_str(&body) {
                        Ok(value) => value,
                        Err(_) => {
                            respond_json(request, 400, &serde_json::json!({"error": "invalid json"}));
                            continue;
                        }
                    };
                    if parsed.get("url").and_then(Value::as_str).is_none()
                        || parsed.get("schema").and_then(Value::as_str).is_none()
                    {
                        respond_json(
                            request,
                            400,
                            &serde_json::json!({"error": "url and schema are required"}),
                        );
                        continue;
                    }

                    let configured = if path == "/api/v1/extract" {
                        config.extract_response.as_ref()
                    } else {
                        config.start_response.as_ref()
                    };
                    match configured {
                        Some((status, body)) => respond_json(request, *status, body),
                        None => respond_json(
                            request,
                            404,
                            &serde_json::json!({"error": "endpoint not scripted"}),
                        ),
                    }
                    continue;
                }

                if !is_post && path.starts_with("/api/v1/jobs/") {
                    let reply = config
                        .poll_replies
                        .get(poll_index)
                        .or_else(|| config.poll_replies.last());
                    poll_index += 1;

                    match reply {
                        Some(PollReply::NotFound) | None => respond_json(
                            request,
                            404,
                            &serde_json::json!({"error": "job not found"}),
                        ),
                        Some(PollReply::Body(body)) => respond_json(request, 200, body),
                    }
                    continue;
                }

                respond_json(request, 404, &serde_json::json!({"error": "not found"}));
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for ExtractionStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond_json(request: tiny_http::Request, status: u16, body: &Value) {
    let mut response =
        tiny_http::Response::from_string(body.to_string()).with_status_code(status);
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    response = response.with_header(header);
    let _ = request.respond(response);
}
