mod steps;

use crate::browser::{Browser, BrowserOptions, Page, TraceRecorder};
use crate::flow::CheckoutScript;
use crate::Result;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one run of the scripted flow.
#[derive(Debug)]
pub struct RunResult {
    /// Whether every step completed.
    pub success: bool,
    /// Error message if the run aborted.
    pub error: Option<String>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    /// Trace files whose capture window completed, in capture order.
    pub traces: Vec<PathBuf>,
}

/// Executes the scripted flow against one browser/page pair, which it owns
/// exclusively for the whole run.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Launch a browser and open the single page the run will use.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let browser = Browser::launch(options).await?;
        let page = browser.new_page().await?;
        Ok(Self { browser, page })
    }

    /// Run the flow to completion or first failure. The browser is closed on
    /// every path; any step failure is terminal and reported in the result.
    pub async fn run(self, script: &CheckoutScript) -> RunResult {
        let start = Instant::now();
        let mut traces = Vec::new();

        let outcome = Self::run_once(&self.page, script, &mut traces).await;

        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {}", e);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => RunResult {
                success: true,
                error: None,
                duration_ms,
                traces,
            },
            Err(e) => {
                warn!("run aborted: {}", e);
                RunResult {
                    success: false,
                    error: Some(e.to_string()),
                    duration_ms,
                    traces,
                }
            }
        }
    }

    async fn run_once(
        page: &Page,
        script: &CheckoutScript,
        traces: &mut Vec<PathBuf>,
    ) -> Result<()> {
        script.validate()?;

        page.goto(&script.url, script.timeout_ms).await?;

        let recorder = TraceRecorder::start(page, &script.trace_login).await?;
        steps::login(page, script).await?;
        traces.push(recorder.stop().await?);

        let recorder = TraceRecorder::start(page, &script.trace_checkout).await?;
        steps::checkout(page, script).await?;
        traces.push(recorder.stop().await?);

        info!("flow completed: {} trace files written", traces.len());
        Ok(())
    }
}
