//! Integration tests for blazetrace
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored
//!
//! All tests but the last drive `data:` pages and need no network access.

use blazetrace::{Browser, BrowserOptions, CheckoutScript, Error, Page, Runner, TraceRecorder};

/// Check if Chrome is available
fn chrome_available() -> bool {
    chromiumoxide::detection::default_executable(Default::default()).is_ok()
}

fn test_options() -> BrowserOptions {
    BrowserOptions {
        headless: true,
        slow_mo_ms: 0,
        ..Default::default()
    }
}

async fn launch() -> (Browser, Page) {
    let browser = Browser::launch(&test_options())
        .await
        .expect("Failed to launch browser");
    let page = browser.new_page().await.expect("Failed to create page");
    (browser, page)
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_wait_for_visible_delayed_element() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = launch().await;

    page.goto(
        r##"data:text/html,
        <div id="late" style="display:none">late</div>
        <script>
            setTimeout(() => { document.getElementById('late').style.display = 'block'; }, 400);
        </script>
    "##,
        10_000,
    )
    .await
    .expect("Failed to navigate");

    page.wait_for_visible("#late", 5_000)
        .await
        .expect("Element never became visible");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_wait_for_visible_times_out() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = launch().await;

    page.goto(r#"data:text/html,<p>nothing here</p>"#, 10_000)
        .await
        .expect("Failed to navigate");

    let err = page
        .wait_for_visible("#missing", 800)
        .await
        .expect_err("Wait should have timed out");
    assert!(matches!(err, Error::Timeout(_)), "got: {}", err);
    assert!(err.to_string().contains("#missing"));

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_click_link_by_text() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = launch().await;

    page.goto(
        r##"data:text/html,
        <a onclick="document.title = 'clicked'">Samsung galaxy s6</a>
    "##,
        10_000,
    )
    .await
    .expect("Failed to navigate");

    page.click_link_by_text("Samsung galaxy s6")
        .await
        .expect("Failed to click link");

    let title = page.evaluate("document.title").await.expect("eval failed");
    assert_eq!(title, serde_json::json!("clicked"));

    let err = page
        .click_link_by_text("Nokia lumia")
        .await
        .expect_err("Absent item should not be clickable");
    assert!(err.to_string().contains("Nokia lumia"), "got: {}", err);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_dialog_is_dismissed() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = launch().await;

    page.goto(
        r##"data:text/html,
        <button id="btn" onclick="window.__r = 'pre'; alert('product added'); window.__r = 'post';">
            Add to cart
        </button>
    "##,
        10_000,
    )
    .await
    .expect("Failed to navigate");

    page.dismiss_dialogs().await.expect("Failed to subscribe");
    page.click("#btn").await.expect("Failed to click");

    // The alert blocks script execution until it is dismissed; once __r is
    // 'post' the dialog can no longer be blocking anything.
    let mut settled = false;
    for _ in 0..50 {
        let r = page.evaluate("window.__r || ''").await.expect("eval failed");
        if r == serde_json::json!("post") {
            settled = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert!(settled, "dialog was not dismissed");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_trace_capture_writes_file() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("trace.json");

    let (browser, page) = launch().await;

    page.goto(r#"data:text/html,<h1>traced</h1>"#, 10_000)
        .await
        .expect("Failed to navigate");

    let recorder = TraceRecorder::start(&page, &path)
        .await
        .expect("Failed to start trace");

    page.evaluate("document.title = 'busy'")
        .await
        .expect("eval failed");
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let written = recorder.stop().await.expect("Failed to stop trace");
    assert_eq!(written, path);

    let raw = std::fs::read(&path).expect("Trace file missing");
    assert!(!raw.is_empty());
    let parsed: serde_json::Value = serde_json::from_slice(&raw).expect("Trace is not JSON");
    assert!(parsed["traceEvents"].is_array());

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_runner_reports_failure_and_tears_down() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut script = CheckoutScript::demoblaze();
    script.url = r#"data:text/html,<p>not a store</p>"#.into();
    script.trace_login = dir.path().join("login.json");
    script.trace_checkout = dir.path().join("checkout.json");
    script.timeout_ms = 1_500;

    let runner = Runner::launch(&test_options())
        .await
        .expect("Failed to launch runner");
    let result = runner.run(&script).await;

    assert!(!result.success);
    let error = result.error.expect("error message missing");
    assert!(error.contains(&script.selectors.login_open), "got: {}", error);
    assert!(result.traces.is_empty());
    assert!(!script.trace_login.exists());
}

#[tokio::test]
#[ignore = "requires Chrome and network access"]
async fn test_full_demoblaze_flow() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut script = CheckoutScript::demoblaze();
    script.trace_login = dir.path().join("trace-login.json");
    script.trace_checkout = dir.path().join("trace-checkout.json");

    let runner = Runner::launch(&test_options())
        .await
        .expect("Failed to launch runner");
    let result = runner.run(&script).await;

    assert!(result.success, "run failed: {:?}", result.error);
    assert_eq!(result.traces.len(), 2);
    for trace in &result.traces {
        let meta = std::fs::metadata(trace).expect("trace file missing");
        assert!(meta.len() > 0, "trace file is empty: {}", trace.display());
    }
}
