use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use url::Url;

use crate::{info_time, warn_time, Error, Result, ELEMENT_POLL_INTERVAL, ELEMENT_WAIT_TIMEOUT};

/// Starts a fresh browser session. Every page fetch gets its own session.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: Browser;

    async fn launch(&self) -> Result<Self::Session>;
}

/// One live browser session.
#[async_trait]
pub trait Browser: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Whether an element matching the CSS `selector` is present right now.
    async fn has_element(&mut self, selector: &str) -> Result<bool>;

    async fn page_source(&mut self) -> Result<String>;

    async fn shutdown(self) -> Result<()>;

    /// Polls until `selector` is present, or fails with `AcquisitionTimeout` once `timeout` has passed.
    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.has_element(selector).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::AcquisitionTimeout {
                    selector: selector.into(),
                    timeout,
                });
            }
            sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }
}

/// Opens `url` in a new session, waits for `wait_selector` and returns the page source.
/// The session is shut down whether or not the fetch worked.
pub async fn acquire_page_source<L: BrowserLauncher>(
    launcher: &L,
    url: &str,
    wait_selector: &str,
) -> Result<String> {
    let mut session = launcher.launch().await?;

    let source = async {
        session.navigate(url).await?;
        session
            .wait_for_element(wait_selector, ELEMENT_WAIT_TIMEOUT)
            .await?;
        session.page_source().await
    }
    .await;

    match source {
        Ok(html) => {
            session.shutdown().await?;
            Ok(html)
        }
        Err(e) => {
            warn_time!("Fetching {url} failed: {e}");
            if let Err(close_err) = session.shutdown().await {
                warn_time!("Couldn't shut the browser session down: {close_err}");
            }
            Err(e)
        }
    }
}

/// Talks to a W3C WebDriver server (e.g. chromedriver) over HTTP.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    client: Client,
    endpoint: Url,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(endpoint: &str, headless: bool) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(endpoint)?,
            headless,
        })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession> {
        let url = join_segments(&self.endpoint, &["session"])?;
        let value = send(self.client.post(url).json(&capabilities(self.headless))).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::WebDriver {
                status: 200,
                message: format!("new session response has no sessionId: {value}"),
            })?;

        Ok(WebDriverSession {
            client: self.client.clone(),
            session_url: join_segments(&self.endpoint, &["session", session_id])?,
        })
    }
}

#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    session_url: Url,
}

impl WebDriverSession {
    fn command_url(&self, command: &str) -> Result<Url> {
        join_segments(&self.session_url, &[command])
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        info_time!("Loading {url}");
        let command = self.command_url("url")?;
        send(self.client.post(command).json(&json!({ "url": url }))).await?;
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool> {
        let command = self.command_url("element")?;
        let body = json!({ "using": "css selector", "value": selector });
        match send(self.client.post(command).json(&body)).await {
            Ok(_) => Ok(true),
            Err(Error::WebDriver { message, .. }) if message.starts_with(NO_SUCH_ELEMENT) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        let command = self.command_url("source")?;
        let value = send(self.client.get(command)).await?;
        match value {
            Value::String(html) => Ok(html),
            other => Err(Error::WebDriver {
                status: 200,
                message: format!("page source wasn't a string: {other}"),
            }),
        }
    }

    async fn shutdown(self) -> Result<()> {
        send(self.client.delete(self.session_url)).await?;
        Ok(())
    }
}

const NO_SUCH_ELEMENT: &str = "no such element";

fn capabilities(headless: bool) -> Value {
    let mut args = vec!["--disable-gpu", "--window-size=1280,1024"];
    if headless {
        args.push("--headless=new");
    }
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

/// Sends a WebDriver command and unwraps the `value` field of the reply.
async fn send(request: RequestBuilder) -> Result<Value> {
    let res = request.send().await?;
    let status = res.status();
    let mut body: Value = res.json().await?;
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if status.is_success() {
        Ok(value)
    } else {
        Err(Error::WebDriver {
            status: status.as_u16(),
            message: error_message(&value),
        })
    }
}

/// Formats a WebDriver error value as `"<error code>: <message>"`.
fn error_message(value: &Value) -> String {
    let code = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    match value.get("message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => format!("{code}: {message}"),
        _ => code.to_string(),
    }
}

pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
