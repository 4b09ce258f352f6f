//! Status reporter that calls back over HTTP.

use crate::pipeline::{
    domain::{ImageReport, TaskReport},
    ports::{ReportError, StatusReporter},
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default request timeout for status callbacks.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// [`StatusReporter`] that PUTs JSON to `<callback>/images/status` and
/// `<callback>/tasks/status`.
#[derive(Debug, Clone)]
pub struct HttpStatusReporter {
    client: reqwest::Client,
    callback: String,
}

impl HttpStatusReporter {
    /// Creates a reporter for the callback base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Request`] when the HTTP client cannot be built.
    pub fn new(callback: impl Into<String>, timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base: String = callback.into();
        Ok(Self {
            client,
            callback: base.trim_end_matches('/').to_owned(),
        })
    }

    async fn put(&self, path: &str, body: &impl Serialize) -> Result<(), ReportError> {
        let url = format!("{}{path}", self.callback);
        let response = self.client.put(&url).json(body).send().await?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "status callback answered");
        if status.is_success() {
            Ok(())
        } else {
            Err(ReportError::Status {
                url,
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl StatusReporter for HttpStatusReporter {
    async fn report_image(&self, report: &ImageReport) -> Result<(), ReportError> {
        self.put("/images/status", report).await
    }

    async fn report_task(&self, report: &TaskReport) -> Result<(), ReportError> {
        self.put("/tasks/status", report).await
    }
}

#[cfg(test)]
mod tests {
    use super::HttpStatusReporter;
    use crate::pipeline::domain::{ImageReport, TaskReport};
    use crate::pipeline::ports::{ReportError, StatusReporter};
    use crate::store::domain::{ImageStatus, TaskStatus};
    use rstest::rstest;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Captured request line and decoded JSON body.
    struct Received {
        request_line: String,
        body: serde_json::Value,
    }

    async fn read_request(socket: &mut TcpStream) -> Received {
        let mut raw = Vec::new();
        let mut chunk = [0_u8; 1024];
        let (head, body) = loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            raw.extend_from_slice(chunk.get(..read).expect("chunk"));
            if let Some(end) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..end]).into_owned();
                let length = head
                    .lines()
                    .map(str::to_ascii_lowercase)
                    .find_map(|line| {
                        line.strip_prefix("content-length:")
                            .and_then(|value| value.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length || read == 0 {
                    break (head, raw[end + 4..].to_vec());
                }
            }
            assert!(read > 0, "connection closed before the request ended");
        };
        Received {
            request_line: head.lines().next().unwrap_or_default().to_owned(),
            body: serde_json::from_slice(&body).expect("json body"),
        }
    }

    /// Accepts one connection and answers it with `status`.
    async fn callback_answering(status: &'static str) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let received = read_request(&mut socket).await;
            let response =
                format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.expect("respond");
            received
        });
        (format!("http://{address}/"), server)
    }

    fn reporter(callback: &str) -> HttpStatusReporter {
        HttpStatusReporter::new(callback, Duration::from_secs(5)).expect("client")
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn image_outcome_is_put_as_json() {
        let (callback, server) = callback_answering("200 OK").await;
        let report = ImageReport {
            task_id: 7,
            name: "docker.io/library/nginx:1.25".to_owned(),
            status: ImageStatus::Failed,
            message: "push denied".to_owned(),
        };

        reporter(&callback).report_image(&report).await.expect("report");

        let received = server.await.expect("server");
        assert_eq!(received.request_line, "PUT /images/status HTTP/1.1");
        assert_eq!(received.body, serde_json::to_value(&report).expect("json"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn task_outcome_goes_to_the_task_endpoint() {
        let (callback, server) = callback_answering("204 No Content").await;
        let report = TaskReport {
            task_id: 7,
            status: TaskStatus::Succeeded,
            message: String::new(),
        };

        reporter(&callback).report_task(&report).await.expect("report");

        let received = server.await.expect("server");
        assert_eq!(received.request_line, "PUT /tasks/status HTTP/1.1");
        assert_eq!(received.body, serde_json::to_value(&report).expect("json"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_answer_is_a_status_error() {
        let (callback, server) = callback_answering("500 Internal Server Error").await;
        let report = TaskReport {
            task_id: 7,
            status: TaskStatus::Failed,
            message: "login failed".to_owned(),
        };

        let result = reporter(&callback).report_task(&report).await;

        server.await.expect("server");
        let expected = format!("{}/tasks/status", callback.trim_end_matches('/'));
        assert!(matches!(
            result,
            Err(ReportError::Status { status: 500, ref url }) if *url == expected
        ));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_callback_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        drop(listener);
        let report = TaskReport {
            task_id: 7,
            status: TaskStatus::Succeeded,
            message: String::new(),
        };

        let result = reporter(&format!("http://{address}"))
            .report_task(&report)
            .await;

        assert!(matches!(result, Err(ReportError::Request(_))));
    }
}
