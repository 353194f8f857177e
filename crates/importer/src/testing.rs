use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::http::{Transport, TransportError, TransportResult};

type Script<T> = VecDeque<TransportResult<T>>;

/// Extra wait before a scripted answer. `None` never answers.
type Latency = Option<Duration>;

/// Transport that replays scripted responses per URL. The last scripted
/// response for a URL repeats forever. Unscripted GETs answer 404.
pub(crate) struct ScriptedTransport {
    pages: Mutex<HashMap<String, Script<String>>>,
    statuses: Mutex<HashMap<String, Script<u16>>>,
    latencies: Mutex<HashMap<String, Latency>>,
    resolves: AtomicBool,
    log: Mutex<Vec<String>>,
    fetched_at: Mutex<Vec<(String, Instant)>>,
}

fn next_of<T: Clone>(script: &mut Script<T>) -> Option<TransportResult<T>> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            latencies: Mutex::new(HashMap::new()),
            resolves: AtomicBool::new(true),
            log: Mutex::new(Vec::new()),
            fetched_at: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn script(&self, url: &str, responses: Vec<TransportResult<String>>) {
        self.pages
            .lock()
            .unwrap()
            .insert(normalize(url), responses.into());
    }

    pub(crate) fn page(&self, url: &str, body: &str) {
        self.script(url, vec![Ok(body.to_string())]);
    }

    pub(crate) fn script_head(&self, url: &str, responses: Vec<TransportResult<u16>>) {
        self.script_status("HEAD", url, responses);
    }

    pub(crate) fn script_get_status(&self, url: &str, responses: Vec<TransportResult<u16>>) {
        self.script_status("GET", url, responses);
    }

    fn script_status(&self, method: &str, url: &str, responses: Vec<TransportResult<u16>>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, normalize(url)), responses.into());
    }

    pub(crate) fn set_resolves(&self, resolves: bool) {
        self.resolves.store(resolves, Ordering::SeqCst);
    }

    /// `method` is "DNS", "HEAD", "GET" (status only) or "FETCH" (body GET).
    /// DNS ignores `url`.
    pub(crate) fn set_latency(&self, method: &str, url: &str, latency: Duration) {
        self.latencies
            .lock()
            .unwrap()
            .insert(latency_key(method, url), Some(latency));
    }

    pub(crate) fn hang(&self, method: &str, url: &str) {
        self.latencies
            .lock()
            .unwrap()
            .insert(latency_key(method, url), None);
    }

    /// When each body GET for `url` was issued.
    pub(crate) fn fetch_times(&self, url: &str) -> Vec<Instant> {
        let url = normalize(url);
        self.fetched_at
            .lock()
            .unwrap()
            .iter()
            .filter(|(fetched, _)| *fetched == url)
            .map(|(_, at)| *at)
            .collect()
    }

    async fn wait(&self, key: &str) {
        let latency = self.latencies.lock().unwrap().get(key).copied();
        match latency {
            Some(Some(latency)) => tokio::time::sleep(latency).await,
            Some(None) => std::future::pending::<()>().await,
            None => {}
        }
    }

    /// Page fetches (body GETs) made for `url`.
    pub(crate) fn get_count(&self, url: &str) -> usize {
        let key = format!("FETCH {}", normalize(url));
        self.log.lock().unwrap().iter().filter(|e| **e == key).count()
    }

    pub(crate) fn status_count(&self, method: &str, url: &str) -> usize {
        let key = format!("{} {}", method, normalize(url));
        self.log.lock().unwrap().iter().filter(|e| **e == key).count()
    }

    pub(crate) fn total_requests(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn next_status(&self, method: &str, url: &Url) -> TransportResult<u16> {
        let key = format!("{} {}", method, url.as_str());
        self.record(key.clone());
        self.statuses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(next_of)
            .unwrap_or_else(|| Err(TransportError::Connect("unscripted".to_string())))
    }
}

fn latency_key(method: &str, url: &str) -> String {
    if method == "DNS" {
        method.to_string()
    } else {
        format!("{} {}", method, normalize(url))
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url, _timeout: Duration) -> TransportResult<String> {
        let key = format!("FETCH {}", url.as_str());
        self.record(key.clone());
        self.fetched_at
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        self.wait(&key).await;
        self.pages
            .lock()
            .unwrap()
            .get_mut(url.as_str())
            .and_then(next_of)
            .unwrap_or(Err(TransportError::Status(404)))
    }

    async fn head_status(&self, url: &Url, _timeout: Duration) -> TransportResult<u16> {
        let answer = self.next_status("HEAD", url);
        self.wait(&format!("HEAD {}", url.as_str())).await;
        answer
    }

    async fn get_status(&self, url: &Url, _timeout: Duration) -> TransportResult<u16> {
        let answer = self.next_status("GET", url);
        self.wait(&format!("GET {}", url.as_str())).await;
        answer
    }

    async fn resolve(&self, _host: &str, _port: u16) -> bool {
        self.wait("DNS").await;
        self.resolves.load(Ordering::SeqCst)
    }
}
