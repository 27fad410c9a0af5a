use crate::{Error, Result};
use std::path::PathBuf;

/// The DOM selectors the flow interacts with, in the order they are used.
#[derive(Debug, Clone)]
pub struct Selectors {
    /// Navbar control that opens the login modal.
    pub login_open: String,
    /// Username field inside the login modal.
    pub login_username: String,
    /// Password field inside the login modal.
    pub login_password: String,
    /// Submit button inside the login modal.
    pub login_submit: String,
    /// Navbar element showing the signed-in username.
    pub logged_in_user: String,
    /// Add-to-cart control on the product page.
    pub add_to_cart: String,
    /// Navbar link to the cart page.
    pub cart_link: String,
    /// Place-order control on the cart page.
    pub place_order: String,
    /// Name field in the order modal.
    pub order_name: String,
    /// Country field in the order modal.
    pub order_country: String,
    /// City field in the order modal.
    pub order_city: String,
    /// Credit card field in the order modal.
    pub order_card: String,
    /// Month field in the order modal.
    pub order_month: String,
    /// Year field in the order modal.
    pub order_year: String,
    /// Purchase button in the order modal.
    pub purchase: String,
    /// OK button on the purchase confirmation.
    pub confirm_ok: String,
}

impl Selectors {
    /// Iterate over (field name, selector) pairs, in flow order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("login_open", self.login_open.as_str()),
            ("login_username", self.login_username.as_str()),
            ("login_password", self.login_password.as_str()),
            ("login_submit", self.login_submit.as_str()),
            ("logged_in_user", self.logged_in_user.as_str()),
            ("add_to_cart", self.add_to_cart.as_str()),
            ("cart_link", self.cart_link.as_str()),
            ("place_order", self.place_order.as_str()),
            ("order_name", self.order_name.as_str()),
            ("order_country", self.order_country.as_str()),
            ("order_city", self.order_city.as_str()),
            ("order_card", self.order_card.as_str()),
            ("order_month", self.order_month.as_str()),
            ("order_year", self.order_year.as_str()),
            ("purchase", self.purchase.as_str()),
            ("confirm_ok", self.confirm_ok.as_str()),
        ]
        .into_iter()
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            login_open: "#login2".into(),
            login_username: "#loginusername".into(),
            login_password: "#loginpassword".into(),
            login_submit: "[onclick=\"logIn()\"]".into(),
            logged_in_user: "#nameofuser".into(),
            add_to_cart: "[onclick=\"addToCart(1)\"]".into(),
            cart_link: "#cartur".into(),
            place_order: "[data-target=\"#orderModal\"]".into(),
            order_name: "#name".into(),
            order_country: "#country".into(),
            order_city: "#city".into(),
            order_card: "#card".into(),
            order_month: "#month".into(),
            order_year: "#year".into(),
            purchase: "[onclick=\"purchaseOrder()\"]".into(),
            confirm_ok: ".confirm.btn.btn-lg.btn-primary".into(),
        }
    }
}

/// Login credentials for the demo account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "ArgenisPintoTester".into(),
            password: "abcdef".into(),
        }
    }
}

/// The six values typed into the order modal.
#[derive(Debug, Clone)]
pub struct OrderForm {
    pub name: String,
    pub country: String,
    pub city: String,
    pub card: String,
    pub month: String,
    pub year: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            name: "Argenis Pinto".into(),
            country: "Argentina".into(),
            city: "Buenos Aires".into(),
            card: "123456789".into(),
            month: "Septiembre".into(),
            year: "2024".into(),
        }
    }
}

/// One complete invocation of the scripted flow: target URL, selector set,
/// credentials, order values, catalog item text, trace output paths and the
/// per-wait timeout.
#[derive(Debug, Clone)]
pub struct CheckoutScript {
    /// Store URL to navigate to.
    pub url: String,
    /// Selector set, in flow order.
    pub selectors: Selectors,
    /// Login credentials.
    pub credentials: Credentials,
    /// Order form values.
    pub order: OrderForm,
    /// Visible text of the catalog item to open.
    pub item_text: String,
    /// Output path for the login-phase trace.
    pub trace_login: PathBuf,
    /// Output path for the checkout-phase trace.
    pub trace_checkout: PathBuf,
    /// Timeout applied to every wait in the flow, in milliseconds.
    pub timeout_ms: u64,
}

impl CheckoutScript {
    /// The canonical hard-coded flow against <https://www.demoblaze.com/>.
    pub fn demoblaze() -> Self {
        Self {
            url: "https://www.demoblaze.com/".into(),
            selectors: Selectors::default(),
            credentials: Credentials::default(),
            order: OrderForm::default(),
            item_text: "Samsung galaxy s6".into(),
            trace_login: "trace-login.json".into(),
            trace_checkout: "trace-checkout.json".into(),
            timeout_ms: 30_000,
        }
    }

    /// Validate the script before running it.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Script("target url is required".into()));
        }
        if self.item_text.is_empty() {
            return Err(Error::Script("item text is required".into()));
        }
        for (name, selector) in self.selectors.iter() {
            if selector.is_empty() {
                return Err(Error::Script(format!("selector '{}' is empty", name)));
            }
        }
        if self.trace_login.as_os_str().is_empty() || self.trace_checkout.as_os_str().is_empty() {
            return Err(Error::Script("trace output paths are required".into()));
        }
        if self.trace_login == self.trace_checkout {
            return Err(Error::Script(
                "trace output paths must be distinct".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Script("timeout_ms must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for CheckoutScript {
    fn default() -> Self {
        Self::demoblaze()
    }
}
