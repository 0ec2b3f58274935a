use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, Method};
use serde_json::Value;
use tokio::time::sleep;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Basic-auth credential pair, held for the duration of one invocation.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Outcome of a single transport call.
///
/// Non-2xx responses and undecodable bodies collapse to `Empty` at this
/// boundary; exhausted retries collapse to `Failed`. Neither is ever
/// surfaced as an `Err` to callers.
#[derive(Debug, Clone)]
pub enum Fetched {
    /// 2xx response: parsed JSON body plus the pagination continuation flag
    Payload { body: Value, has_next: bool },
    /// Nothing retrieved (HTTP-level error swallowed, or genuinely empty)
    Empty,
    /// Connection-class failures exhausted every retry attempt
    Failed(Method),
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fetched::Payload {
                body: Value::Null, ..
            } => f.write_str("{}"),
            Fetched::Payload { body, .. } => write!(f, "{}", body),
            Fetched::Empty => f.write_str("{}"),
            Fetched::Failed(method) => write!(f, "{} REQUEST FAILED", method),
        }
    }
}

/// Issues one HTTP request at a time against the registry API.
pub struct Transport {
    credentials: Credentials,
    retry_delay: Duration,
    verbose: bool,
}

impl Transport {
    pub fn new(credentials: Credentials, verbose: bool) -> Self {
        Self {
            credentials,
            retry_delay: RETRY_DELAY,
            verbose,
        }
    }

    /// Override the fixed inter-attempt delay so tests stay fast.
    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub async fn get(&self, url: &str) -> Fetched {
        self.execute(Method::GET, url, None).await
    }

    pub async fn delete(&self, url: &str) -> Fetched {
        self.execute(Method::DELETE, url, None).await
    }

    #[allow(dead_code)]
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Fetched {
        self.execute(Method::POST, url, body).await
    }

    /// Issue a single logical request. Connection-class failures are
    /// retried up to MAX_ATTEMPTS with a fixed delay in between; any
    /// other failure is logged and swallowed.
    pub async fn execute(&self, method: Method, url: &str, body: Option<&Value>) -> Fetched {
        let mut attempt = 1;
        loop {
            match self.attempt(method.clone(), url, body).await {
                Ok(fetched) => return fetched,
                Err(e) if is_transient(&e) && attempt < MAX_ATTEMPTS => {
                    eprintln!(
                        "[WARN] {} {} attempt {}/{} failed: {}",
                        method, url, attempt, MAX_ATTEMPTS, e
                    );
                    attempt += 1;
                    sleep(self.retry_delay).await;
                }
                Err(e) if is_transient(&e) => {
                    eprintln!(
                        "[ERROR] {} {} failed after {} attempts: {}",
                        method, url, MAX_ATTEMPTS, e
                    );
                    return Fetched::Failed(method);
                }
                Err(e) => {
                    eprintln!("[ERROR] Error in calling {} API: {}", method, e);
                    return Fetched::Empty;
                }
            }
        }
    }

    /// One attempt. The client is scoped to this call, so the connection
    /// is released on every exit path; the body is fully buffered into an
    /// owned value before the client goes out of scope.
    async fn attempt(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Fetched, reqwest::Error> {
        if self.verbose {
            eprintln!("[DEBUG] {} {}", method, url);
        }

        let client = Client::new();
        let mut request = client
            .request(method.clone(), url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password));
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await?;

        let status = response.status();
        let has_next = has_next_link(response.headers());
        if !status.is_success() {
            eprintln!("[ERROR] {} {} returned status {}", method, url, status);
            return Ok(Fetched::Empty);
        }

        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            // DELETE responses carry no body
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    eprintln!("[ERROR] {} {} returned an unparseable body: {}", method, url, e);
                    return Ok(Fetched::Empty);
                }
            }
        };

        Ok(Fetched::Payload { body, has_next })
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout()
}

/// Continuation signal: a Link header carrying rel="next". Presence only;
/// the next URL is never taken from the header.
fn has_next_link(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .map(|link| link.contains("rel=\"next\""))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> Transport {
        Transport::new(
            Credentials {
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            false,
        )
        .with_retry_delay(Duration::from_millis(10))
    }

    /// A loopback port with nothing listening on it.
    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn get_parses_payload_and_continuation() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/projects"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"name": "library"}]))
                    .insert_header("Link", "</projects?page=2>; rel=\"next\""),
            )
            .mount(&server)
            .await;

        let fetched = transport().get(&format!("{}/projects", server.uri())).await;
        match fetched {
            Fetched::Payload { body, has_next } => {
                assert!(has_next);
                assert_eq!(body[0]["name"], "library");
            }
            other => panic!("expected payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn last_page_has_no_continuation() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let fetched = transport().get(&format!("{}/projects", server.uri())).await;
        match fetched {
            Fetched::Payload { has_next, .. } => assert!(!has_next),
            other => panic!("expected payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_error_is_swallowed_to_empty() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetched = transport().get(&format!("{}/projects", server.uri())).await;
        assert!(matches!(fetched, Fetched::Empty));
    }

    #[tokio::test]
    async fn delete_with_empty_body_is_a_payload() {
        let server = MockServer::start().await;
        Mock::given(http_method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/artifacts/sha256%3Aabcd/tags/v1", server.uri());
        let fetched = transport().delete(&url).await;
        match fetched {
            Fetched::Payload { body, has_next } => {
                assert!(body.is_null());
                assert!(!has_next);
            }
            other => panic!("expected payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let body = serde_json::json!({"project_name": "demo"});
        let fetched = transport()
            .post(&format!("{}/projects", server.uri()), Some(&body))
            .await;
        match fetched {
            Fetched::Payload { body, .. } => assert!(body.is_null()),
            other => panic!("expected payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_failure_exhausts_three_attempts() {
        let port = free_port();
        let started = std::time::Instant::now();

        let fetched = transport()
            .get(&format!("http://127.0.0.1:{}/projects", port))
            .await;

        match fetched {
            Fetched::Failed(method) => assert_eq!(method, Method::GET),
            other => panic!("expected exhausted retries, got {:?}", other),
        }
        // two inter-attempt sleeps means three attempts were made
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn second_attempt_recovers() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let port = free_port();
        let addr = format!("127.0.0.1:{}", port);

        // first attempt is refused; the server comes up before attempt 2
        let serve = tokio::spawn({
            let addr = addr.clone();
            async move {
                sleep(Duration::from_millis(50)).await;
                let listener = tokio::net::TcpListener::bind(addr.as_str()).await.unwrap();
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let body = "[]";
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });

        let t = transport().with_retry_delay(Duration::from_millis(300));
        let fetched = t.get(&format!("http://{}/artifacts", addr)).await;
        serve.await.unwrap();

        match fetched {
            Fetched::Payload { body, has_next } => {
                assert_eq!(body, serde_json::json!([]));
                assert!(!has_next);
            }
            other => panic!("expected recovery on the second attempt, got {:?}", other),
        }
    }

    #[test]
    fn failed_displays_method_sentinel() {
        assert_eq!(
            Fetched::Failed(Method::DELETE).to_string(),
            "DELETE REQUEST FAILED"
        );
        assert_eq!(Fetched::Failed(Method::GET).to_string(), "GET REQUEST FAILED");
    }

    #[test]
    fn empty_displays_as_empty_object() {
        assert_eq!(Fetched::Empty.to_string(), "{}");
    }

    #[test]
    fn next_link_is_presence_only() {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, "</projects?page=2>; rel=\"next\"".parse().unwrap());
        assert!(has_next_link(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(LINK, "</projects?page=1>; rel=\"prev\"".parse().unwrap());
        assert!(!has_next_link(&headers));

        assert!(!has_next_link(&HeaderMap::new()));
    }
}
