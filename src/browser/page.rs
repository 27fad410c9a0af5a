use crate::{Error, Result};
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Poll interval for DOM and network-idle waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the network must stay quiet to count as idle.
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Visibility probe; `__SELECTOR__` is replaced with a JSON-encoded selector.
const VISIBLE_PROBE_JS: &str = r#"(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
})()"#;

/// Click the first anchor whose text contains the needle; `__TEXT__` is
/// replaced with a JSON-encoded string.
const CLICK_LINK_BY_TEXT_JS: &str = r#"(() => {
    const needle = __TEXT__;
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_ELEMENT, null);
    while (walker.nextNode()) {
        const el = walker.currentNode;
        if (el.tagName === 'A' && (el.textContent || '').includes(needle)) {
            el.click();
            return true;
        }
    }
    return false;
})()"#;

/// A single browser tab with the operations the scripted flow needs.
///
/// Network activity is tracked from creation so navigations can settle the way
/// the flow expects (no in-flight requests for a quiet window).
pub struct Page {
    inner: chromiumoxide::Page,
    slow_mo: Duration,
    inflight: Arc<AtomicI64>,
    last_activity: Arc<Mutex<Instant>>,
}

impl Page {
    pub(crate) async fn attach(inner: chromiumoxide::Page, slow_mo: Duration) -> Result<Self> {
        let page = Self {
            inner,
            slow_mo,
            inflight: Arc::new(AtomicI64::new(0)),
            last_activity: Arc::new(Mutex::new(Instant::now())),
        };
        page.watch_network().await?;
        Ok(page)
    }

    /// Enable the Network domain and keep an in-flight request count.
    async fn watch_network(&self) -> Result<()> {
        self.inner.execute(network::EnableParams::default()).await?;

        let mut started = self
            .inner
            .event_listener::<network::EventRequestWillBeSent>()
            .await?;
        let inflight = self.inflight.clone();
        let last = self.last_activity.clone();
        tokio::spawn(async move {
            while let Some(event) = started.next().await {
                // data: loads do not reliably emit loading-finished events;
                // counting them would pin the page as never idle.
                if event.request.url.starts_with("data:") {
                    continue;
                }
                inflight.fetch_add(1, Ordering::Relaxed);
                *last.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
            }
        });

        let mut finished = self
            .inner
            .event_listener::<network::EventLoadingFinished>()
            .await?;
        let inflight = self.inflight.clone();
        let last = self.last_activity.clone();
        tokio::spawn(async move {
            while finished.next().await.is_some() {
                decrement(&inflight);
                *last.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
            }
        });

        let mut failed = self
            .inner
            .event_listener::<network::EventLoadingFailed>()
            .await?;
        let inflight = self.inflight.clone();
        let last = self.last_activity.clone();
        tokio::spawn(async move {
            while failed.next().await.is_some() {
                decrement(&inflight);
                *last.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
            }
        });

        Ok(())
    }

    pub(crate) fn cdp(&self) -> &chromiumoxide::Page {
        &self.inner
    }

    async fn pace(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }

    /// Navigate and wait for the network to go idle.
    pub async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()> {
        info!("navigating to {}", url);
        self.inner.goto(url).await?;
        self.wait_for_network_idle(timeout_ms).await
    }

    /// Wait for a pending navigation to finish, then for the network to settle.
    pub async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<()> {
        debug!("waiting for navigation");
        tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.inner.wait_for_navigation(),
        )
        .await
        .map_err(|_| Error::Timeout(format!("navigation not complete after {}ms", timeout_ms)))??;
        self.wait_for_network_idle(timeout_ms).await
    }

    /// Wait until no request has been in flight for [`NETWORK_IDLE_WINDOW`].
    pub async fn wait_for_network_idle(&self, timeout_ms: u64) -> Result<()> {
        let start = Instant::now();
        loop {
            let inflight = self.inflight.load(Ordering::Relaxed);
            let quiet = self
                .last_activity
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .elapsed()
                >= NETWORK_IDLE_WINDOW;
            if inflight <= 0 && quiet {
                return Ok(());
            }
            if start.elapsed() >= Duration::from_millis(timeout_ms) {
                return Err(Error::Timeout(format!(
                    "network not idle after {}ms",
                    timeout_ms
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Poll until the selector matches a visible element.
    pub async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        debug!("waiting for '{}' to be visible", selector);
        let js = visible_probe(selector)?;
        let start = Instant::now();
        loop {
            // Evaluation can fail while a navigation swaps the execution
            // context; treat that the same as not-yet-visible and keep polling.
            let visible = match self.inner.evaluate(js.as_str()).await {
                Ok(result) => result.into_value::<bool>().unwrap_or(false),
                Err(_) => false,
            };
            if visible {
                return Ok(());
            }
            if start.elapsed() >= Duration::from_millis(timeout_ms) {
                return Err(Error::Timeout(format!(
                    "selector '{}' not visible after {}ms",
                    selector, timeout_ms
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Find and click an element.
    pub async fn click(&self, selector: &str) -> Result<()> {
        info!("click: {}", selector);
        let element = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::ActionFailed(format!("element '{}' not found: {}", selector, e)))?;
        element.click().await?;
        self.pace().await;
        Ok(())
    }

    /// Focus an input element and type into it.
    pub async fn type_text(&self, selector: &str, value: &str) -> Result<()> {
        debug!("type: {} ({} chars)", selector, value.len());
        let element = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::ActionFailed(format!("input '{}' not found: {}", selector, e)))?;
        element.click().await?;
        element.type_str(value).await?;
        self.pace().await;
        Ok(())
    }

    /// Click the first anchor whose visible text contains `text`.
    pub async fn click_link_by_text(&self, text: &str) -> Result<()> {
        info!("click link by text: '{}'", text);
        let js = click_link_js(text)?;
        let clicked = self
            .inner
            .evaluate(js.as_str())
            .await?
            .into_value::<bool>()
            .unwrap_or(false);
        if !clicked {
            return Err(Error::ActionFailed(format!(
                "link with text '{}' not found",
                text
            )));
        }
        self.pace().await;
        Ok(())
    }

    /// Dismiss every browser-native dialog (alert/confirm/prompt) from now on.
    /// The subscription is never deregistered; it lives as long as the page.
    pub async fn dismiss_dialogs(&self) -> Result<()> {
        let mut dialogs = self
            .inner
            .event_listener::<EventJavascriptDialogOpening>()
            .await?;
        let page = self.inner.clone();
        tokio::spawn(async move {
            while let Some(dialog) = dialogs.next().await {
                info!("dialog detected: {}", dialog.message);
                if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(false)).await {
                    warn!("failed to dismiss dialog: {}", e);
                }
            }
        });
        Ok(())
    }

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&self, js: &str) -> Result<serde_json::Value> {
        let result = self.inner.evaluate(js).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Current page URL, if known.
    pub async fn url(&self) -> Result<Option<String>> {
        Ok(self.inner.url().await?)
    }
}

/// Decrement an in-flight counter without letting it go negative; completion
/// events can arrive for requests that were never counted.
fn decrement(counter: &AtomicI64) {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
            Some(if n > 0 { n - 1 } else { 0 })
        })
        .ok();
}

fn visible_probe(selector: &str) -> Result<String> {
    Ok(VISIBLE_PROBE_JS.replace("__SELECTOR__", &serde_json::to_string(selector)?))
}

fn click_link_js(text: &str) -> Result<String> {
    Ok(CLICK_LINK_BY_TEXT_JS.replace("__TEXT__", &serde_json::to_string(text)?))
}
