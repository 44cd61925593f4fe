use std::{path::Path, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};
use miette::{Context, IntoDiagnostic};
use reqwest::{blocking::Client, Method};
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::{Browser, Chromedriver};
use crate::result::{bail, Result};

/// Key under which W3C WebDriver returns element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Upper bound for a single WebDriver command, page loads included
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Reference to an element of the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

/// Chrome controlled through the [W3C WebDriver](https://www.w3.org/TR/webdriver2/) protocol
#[derive(Debug)]
pub struct WebDriver {
    client: Client,
    session_url: String,
    /// Kept alive as long as the session, if we started the driver ourselves
    _driver: Option<Chromedriver>,
}

impl WebDriver {
    /// Open a new Chrome session on the WebDriver endpoint
    pub fn connect(
        endpoint: &str,
        headless: bool,
        window_size: &str,
        driver: Option<Chromedriver>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()
            .into_diagnostic()
            .wrap_err("Could not build the WebDriver HTTP client")?;

        let base = endpoint.trim_end_matches('/');
        let value = send(
            &client,
            Method::POST,
            &format!("{base}/session"),
            Some(capabilities(headless, window_size)),
        )
        .map_err(|err| err.wrap_err_with(|| "Could not create the browser session"))?;

        let Some(session_id) = value.get("sessionId").and_then(Value::as_str) else {
            return bail(format!(
                "Session id missing in response: {}",
                truncate_for_log(&value.to_string(), 220)
            ));
        };
        debug!("Browser session {session_id} created");

        Ok(Self {
            client,
            session_url: format!("{base}/session/{session_id}"),
            _driver: driver,
        })
    }

    /// Run a command of the current session and return its `value`
    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        send(
            &self.client,
            method,
            &format!("{}{path}", self.session_url),
            body,
        )
    }
}

impl Browser for WebDriver {
    type Element = ElementRef;

    fn navigate(&self, url: &str) -> Result<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .map_err(|err| err.wrap_err_with(|| format!("Could not navigate to {url}")))?;
        Ok(())
    }

    fn find_all(&self, scope: Option<&ElementRef>, selector: &str) -> Result<Vec<ElementRef>> {
        let path = match scope {
            Some(ElementRef(id)) => format!("/element/{id}/elements"),
            None => "/elements".to_owned(),
        };
        let value = self.command(
            Method::POST,
            &path,
            Some(json!({ "using": "css selector", "value": selector })),
        )?;

        let Some(elements) = value.as_array() else {
            return bail(format!("Unexpected elements response for '{selector}'"));
        };
        Ok(elements
            .iter()
            .filter_map(|element| element.get(ELEMENT_KEY).and_then(Value::as_str))
            .map(|id| ElementRef(id.to_owned()))
            .collect())
    }

    fn text(&self, element: &ElementRef) -> Result<String> {
        let value = self.command(Method::GET, &format!("/element/{}/text", element.0), None)?;
        Ok(value.as_str().unwrap_or_default().to_owned())
    }

    fn property(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self.command(
            Method::GET,
            &format!("/element/{}/property/{name}", element.0),
            None,
        )?;
        Ok(value.as_str().map(str::to_owned))
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        let value = self.command(Method::GET, "/screenshot", None)?;
        let Some(encoded) = value.as_str() else {
            return bail("Screenshot response is not a string");
        };

        let png = STANDARD
            .decode(encoded)
            .into_diagnostic()
            .wrap_err("Screenshot is not valid base64")?;
        std::fs::write(path, png)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not save screenshot to {}", path.display()))?;
        Ok(())
    }

    fn quit(self) -> Result<()> {
        debug!("Closing browser session");
        self.command(Method::DELETE, "", None)?;
        Ok(())
    }
}

/// Send a WebDriver request and unwrap the `value` of its answer.
///
/// WebDriver errors are reported with their error code and message.
fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> Result<Value> {
    trace!("WebDriver {method} {url}");
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let res = request
        .send()
        .into_diagnostic()
        .wrap_err_with(|| format!("WebDriver request to {url} failed"))?;
    let status = res.status();
    let body = res
        .text()
        .into_diagnostic()
        .wrap_err("Could not read WebDriver response")?;

    let json: Value = match serde_json::from_str(&body) {
        Ok(json) => json,
        Err(_) if !status.is_success() => {
            return bail(format!(
                "WebDriver HTTP {}: {}",
                status.as_u16(),
                truncate_for_log(&body, 260)
            ))
        }
        Err(err) => return bail(format!("Could not parse WebDriver response: {err}")),
    };

    if let Some(error) = json.pointer("/value/error").and_then(Value::as_str) {
        let message = json
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or("unknown webdriver error");
        return bail(format!("{error}: {}", truncate_for_log(message, 260)));
    }
    if !status.is_success() {
        return bail(format!(
            "WebDriver HTTP {}: {}",
            status.as_u16(),
            truncate_for_log(&body, 260)
        ));
    }

    Ok(json.get("value").cloned().unwrap_or(Value::Null))
}

fn capabilities(headless: bool, window_size: &str) -> Value {
    let mut args = Vec::new();
    if headless {
        args.push("--headless=new".to_owned());
    }
    args.push("--disable-gpu".to_owned());
    args.push(format!("--window-size={window_size}"));

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_owned();
    }
    input.chars().take(max_chars).collect::<String>() + "..."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_capabilities() {
        let caps = capabilities(true, "1280,720");
        let args = caps
            .pointer("/capabilities/alwaysMatch/goog:chromeOptions/args")
            .unwrap();
        assert_eq!(
            args,
            &json!(["--headless=new", "--disable-gpu", "--window-size=1280,720"])
        );
    }

    #[test]
    fn visible_capabilities() {
        let caps = capabilities(false, "1920,1080");
        let args = caps
            .pointer("/capabilities/alwaysMatch/goog:chromeOptions/args")
            .and_then(Value::as_array)
            .unwrap();
        assert!(!args.iter().any(|arg| arg.as_str() == Some("--headless=new")));
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("ééééé", 2), "éé...");
    }
}
