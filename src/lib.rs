//! # blazetrace
//!
//! Drives Chrome through the demoblaze login-and-checkout flow and captures two
//! performance trace files, one per phase.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blazetrace::{BrowserOptions, CheckoutScript, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> blazetrace::Result<()> {
//! let script = CheckoutScript::demoblaze();
//! let runner = Runner::launch(&BrowserOptions::default()).await?;
//! let result = runner.run(&script).await;
//! println!("Success: {}", result.success);
//! # Ok(())
//! # }
//! ```

mod browser;
mod flow;
mod runner;

pub use browser::{Browser, BrowserOptions, Page, TraceRecorder};
pub use flow::{CheckoutScript, Credentials, OrderForm, Selectors};
pub use runner::{RunResult, Runner};

/// Result type for blazetrace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running the checkout script.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("script error: {0}")]
    Script(String),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_demoblaze_script_defaults() {
        let script = CheckoutScript::demoblaze();
        assert_eq!(script.url, "https://www.demoblaze.com/");
        assert_eq!(script.item_text, "Samsung galaxy s6");
        assert_eq!(script.selectors.login_open, "#login2");
        assert_eq!(script.selectors.login_username, "#loginusername");
        assert_eq!(script.selectors.login_submit, "[onclick=\"logIn()\"]");
        assert_eq!(script.selectors.logged_in_user, "#nameofuser");
        assert_eq!(script.selectors.add_to_cart, "[onclick=\"addToCart(1)\"]");
        assert_eq!(script.selectors.cart_link, "#cartur");
        assert_eq!(script.selectors.confirm_ok, ".confirm.btn.btn-lg.btn-primary");
        assert_eq!(script.trace_login, PathBuf::from("trace-login.json"));
        assert_eq!(script.trace_checkout, PathBuf::from("trace-checkout.json"));
        assert_eq!(script.timeout_ms, 30_000);
        script.validate().unwrap();
    }

    #[test]
    fn test_default_is_demoblaze() {
        let script = CheckoutScript::default();
        assert_eq!(script.url, CheckoutScript::demoblaze().url);
    }

    #[test]
    fn test_selector_count() {
        let script = CheckoutScript::demoblaze();
        assert_eq!(script.selectors.iter().count(), 16);
    }

    #[test]
    fn test_validation_empty_url() {
        let mut script = CheckoutScript::demoblaze();
        script.url.clear();
        let err = script.validate().unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_validation_empty_selector() {
        let mut script = CheckoutScript::demoblaze();
        script.selectors.place_order.clear();
        let err = script.validate().unwrap_err();
        assert!(err.to_string().contains("place_order"));
    }

    #[test]
    fn test_validation_same_trace_paths() {
        let mut script = CheckoutScript::demoblaze();
        script.trace_checkout = script.trace_login.clone();
        let err = script.validate().unwrap_err();
        assert!(err.to_string().contains("trace"));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut script = CheckoutScript::demoblaze();
        script.timeout_ms = 0;
        assert!(script.validate().is_err());
    }

    #[test]
    fn test_credentials_and_order_defaults() {
        let script = CheckoutScript::demoblaze();
        assert!(!script.credentials.username.is_empty());
        assert!(!script.credentials.password.is_empty());
        assert!(!script.order.name.is_empty());
        assert!(!script.order.card.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Timeout("selector '#login2' not visible after 30000ms".into());
        assert_eq!(
            err.to_string(),
            "timeout: selector '#login2' not visible after 30000ms"
        );

        let err = Error::ActionFailed("link with text 'Nokia' not found".into());
        assert!(err.to_string().starts_with("action failed:"));
    }
}
