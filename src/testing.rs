//! In-memory [`HttpFetch`] for tests and benchmarks.
//!
//! Routes are keyed by exact URL. Unknown URLs answer 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ResolveError, Result};
use crate::http_client::{check_status, FetchRequest, FetchResponse, HttpFetch};

#[derive(Debug, Clone)]
enum Reply {
    Respond(FetchResponse),
    Timeout,
    Panic,
}

#[derive(Debug, Clone)]
struct Route {
    reply: Reply,
    delay: Option<Duration>,
}

/// Canned-response fetcher that records every request it sees.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    log: Arc<Mutex<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, url: &str, reply: Reply) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(url.to_string(), Route { reply, delay: None });
        }
    }

    /// 200 with the given body.
    pub fn ok(&self, url: &str, body: &str) -> &Self {
        self.respond(url, 200, body, &[])
    }

    /// Arbitrary status, body and headers.
    pub fn respond(&self, url: &str, status: u16, body: &str, headers: &[(&str, &str)]) -> &Self {
        let response = FetchResponse {
            url: url.to_string(),
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), (*v).to_string()))
                .collect(),
            cookies: Vec::new(),
            body: body.to_string(),
        };
        self.insert(url, Reply::Respond(response));
        self
    }

    /// 302 to `location`.
    pub fn redirect(&self, url: &str, location: &str) -> &Self {
        self.respond(url, 302, "", &[("location", location)])
    }

    /// Attach `Set-Cookie` pairs to an existing route.
    pub fn with_cookies(&self, url: &str, cookies: &[(&str, &str)]) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            if let Some(Route {
                reply: Reply::Respond(resp),
                ..
            }) = routes.get_mut(url)
            {
                resp.cookies = cookies
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect();
            }
        }
        self
    }

    /// Delay an existing route's reply.
    pub fn delay(&self, url: &str, delay: Duration) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            if let Some(route) = routes.get_mut(url) {
                route.delay = Some(delay);
            }
        }
        self
    }

    /// Fail with [`ResolveError::Timeout`].
    pub fn timeout(&self, url: &str) -> &Self {
        self.insert(url, Reply::Timeout);
        self
    }

    /// Panic inside the fetch.
    pub fn panic(&self, url: &str) -> &Self {
        self.insert(url, Reply::Panic);
        self
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Requests whose URL equals `url`.
    pub fn requests_to(&self, url: &str) -> Vec<FetchRequest> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }

    fn route(&self, url: &str) -> Option<Route> {
        self.routes.lock().ok().and_then(|r| r.get(url).cloned())
    }

    async fn answer(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let Some(route) = self.route(&request.url) else {
            return Err(ResolveError::Status {
                url: request.url.clone(),
                status: 404,
            });
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        match route.reply {
            Reply::Respond(response) => Ok(response),
            Reply::Timeout => Err(ResolveError::Timeout {
                url: request.url.clone(),
                after: Duration::from_secs(15),
            }),
            Reply::Panic => panic!("mock fetch panicked for {}", request.url),
        }
    }
}

#[async_trait]
impl HttpFetch for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }

        let mut current = request.clone();
        for _ in 0..10 {
            let response = self.answer(&current).await?;
            match response.location() {
                Some(next) if current.follow_redirects && response.is_redirect() => {
                    current.url = next.to_string();
                }
                _ => return check_status(request, response),
            }
        }
        Err(ResolveError::Status {
            url: request.url.clone(),
            status: 310,
        })
    }
}
