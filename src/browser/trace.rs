//! Performance trace capture over the CDP Tracing domain.

use crate::{Error, Result};
use chromiumoxide::cdp::browser_protocol::tracing::{
    EndParams, EventDataCollected, EventTracingComplete, StartParams, StartTransferMode,
    TraceConfig,
};
use futures::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Page;

/// Categories recorded into the trace, matching the DevTools timeline set.
const TRACE_CATEGORIES: &[&str] = &[
    "-*",
    "devtools.timeline",
    "v8.execute",
    "disabled-by-default-devtools.timeline",
    "disabled-by-default-devtools.timeline.frame",
    "toplevel",
    "blink.console",
    "blink.user_timing",
    "latencyInfo",
    "disabled-by-default-devtools.timeline.stack",
    "disabled-by-default-v8.cpu_profiler",
];

/// How long to wait for Chrome to flush trace data after Tracing.end.
const COMPLETE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct TraceFile {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<serde_json::Value>,
}

/// An in-progress trace capture.
///
/// Created with [`TraceRecorder::start`]; [`TraceRecorder::stop`] ends the
/// capture and writes the trace file. The file content is Chrome's trace
/// format and is not interpreted here.
pub struct TraceRecorder {
    page: chromiumoxide::Page,
    path: PathBuf,
    events: Arc<Mutex<Vec<serde_json::Value>>>,
    collector: JoinHandle<bool>,
}

impl TraceRecorder {
    /// Subscribe to trace events and start capture on the page's session.
    pub async fn start(page: &Page, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cdp = page.cdp().clone();

        // Subscribe before Tracing.start so no data chunk can be missed.
        let mut chunks = cdp.event_listener::<EventDataCollected>().await?;
        let mut complete = cdp.event_listener::<EventTracingComplete>().await?;

        let events: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let buffer = events.clone();
        let collector = tokio::spawn(async move {
            let mut data_loss = false;
            loop {
                tokio::select! {
                    // Chrome sends the completion event after the last data
                    // chunk; biased polling drains buffered chunks first.
                    biased;
                    chunk = chunks.next() => match chunk {
                        Some(chunk) => {
                            let mut buffer = buffer.lock().await;
                            buffer.extend(chunk.value.iter().cloned());
                        }
                        None => break,
                    },
                    done = complete.next() => {
                        if let Some(done) = done {
                            data_loss = done.data_loss_occurred;
                        }
                        break;
                    }
                }
            }
            data_loss
        });

        let trace_config = TraceConfig::builder()
            .included_categories(
                TRACE_CATEGORIES
                    .iter()
                    .map(|c| (*c).to_string())
                    .collect::<Vec<_>>(),
            )
            .build();
        cdp.execute(
            StartParams::builder()
                .transfer_mode(StartTransferMode::ReportEvents)
                .trace_config(trace_config)
                .build(),
        )
        .await?;
        debug!("trace capture started: {}", path.display());

        Ok(Self {
            page: cdp,
            path,
            events,
            collector,
        })
    }

    /// Stop the capture, wait for Chrome to flush, and write the trace file.
    pub async fn stop(self) -> Result<PathBuf> {
        self.page.execute(EndParams::default()).await?;

        let data_loss = tokio::time::timeout(COMPLETE_TIMEOUT, self.collector)
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "trace '{}' did not complete within {}s",
                    self.path.display(),
                    COMPLETE_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| Error::ActionFailed(format!("trace collector failed: {}", e)))?;
        if data_loss {
            warn!("trace '{}' reported data loss", self.path.display());
        }

        let events = {
            let mut buffer = self.events.lock().await;
            std::mem::take(&mut *buffer)
        };
        debug!("collected {} trace events", events.len());
        write_trace(&self.path, events)?;
        info!("performance trace saved to {}", self.path.display());
        Ok(self.path)
    }
}

/// Serialize trace events into Chrome's trace file envelope, overwriting any
/// existing file at `path`.
fn write_trace(path: &Path, trace_events: Vec<serde_json::Value>) -> Result<()> {
    let file = TraceFile { trace_events };
    std::fs::write(path, serde_json::to_vec(&file)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_trace_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        let events = vec![
            serde_json::json!({"name": "navigationStart", "ph": "R"}),
            serde_json::json!({"name": "Paint", "ph": "X", "dur": 12}),
        ];
        write_trace(&path, events).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert!(!raw.is_empty());
        let parsed: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed["traceEvents"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["traceEvents"][0]["name"], "navigationStart");
    }

    #[test]
    fn test_write_trace_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        write_trace(&path, vec![serde_json::json!({"name": "a"})]).unwrap();
        write_trace(&path, Vec::new()).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["traceEvents"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_trace_categories() {
        assert_eq!(TRACE_CATEGORIES[0], "-*");
        assert!(TRACE_CATEGORIES.contains(&"devtools.timeline"));
        assert!(TRACE_CATEGORIES.contains(&"blink.user_timing"));
    }
}
