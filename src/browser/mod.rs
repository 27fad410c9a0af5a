//! Chrome session plumbing over the DevTools protocol.

mod page;
mod trace;

pub use page::Page;
pub use trace::TraceRecorder;

use crate::{Error, Result};
use chromiumoxide::browser::BrowserConfig;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Browser launch options.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Pause inserted after every interaction, in milliseconds.
    pub slow_mo_ms: u64,
    /// Extra Chrome command line arguments.
    pub chrome_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1280,
            window_height: 720,
            slow_mo_ms: 50,
            chrome_args: Vec::new(),
        }
    }
}

/// A launched Chrome instance and its CDP handler task.
pub struct Browser {
    inner: chromiumoxide::Browser,
    handler: JoinHandle<()>,
    slow_mo: Duration,
}

impl Browser {
    /// Launch Chrome and start processing CDP traffic.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        debug!("launching browser (headless: {})", options.headless);

        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !options.headless {
            builder = builder.with_head();
        }
        for arg in &options.chrome_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(Error::Launch)?;

        let (inner, mut events) = chromiumoxide::Browser::launch(config).await?;

        // The handler drives all CDP websocket traffic and must run for the
        // lifetime of the browser process.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    debug!("CDP handler loop ended");
                    break;
                }
            }
        });

        Ok(Self {
            inner,
            handler,
            slow_mo: Duration::from_millis(options.slow_mo_ms),
        })
    }

    /// Open a new page on about:blank.
    pub async fn new_page(&self) -> Result<Page> {
        let page = self.inner.new_page("about:blank").await?;
        Page::attach(page, self.slow_mo).await
    }

    /// Close the browser and stop the handler task.
    pub async fn close(mut self) -> Result<()> {
        self.inner.close().await?;
        self.handler.abort();
        Ok(())
    }
}
