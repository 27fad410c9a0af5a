//! The fixed step sequence, in source order. Each phase runs under its own
//! trace capture window.

use crate::browser::Page;
use crate::flow::CheckoutScript;
use crate::Result;
use tracing::{debug, info};

/// Open the login modal, sign in and wait for the signed-in state.
pub(crate) async fn login(page: &Page, script: &CheckoutScript) -> Result<()> {
    let s = &script.selectors;
    let t = script.timeout_ms;

    page.wait_for_visible(&s.login_open, t).await?;
    info!("login trigger visible: {}", s.login_open);
    page.click(&s.login_open).await?;

    page.wait_for_visible(&s.login_username, t).await?;
    page.wait_for_visible(&s.login_password, t).await?;
    debug!("login form visible");
    page.type_text(&s.login_username, &script.credentials.username)
        .await?;
    page.type_text(&s.login_password, &script.credentials.password)
        .await?;

    page.wait_for_visible(&s.login_submit, t).await?;
    page.click(&s.login_submit).await?;
    page.wait_for_navigation(t).await?;

    page.wait_for_visible(&s.logged_in_user, t).await?;
    info!("signed in: {} visible", s.logged_in_user);
    Ok(())
}

/// Open the catalog item, add it to the cart and complete the order.
pub(crate) async fn checkout(page: &Page, script: &CheckoutScript) -> Result<()> {
    let s = &script.selectors;
    let t = script.timeout_ms;

    page.click_link_by_text(&script.item_text).await?;
    info!("opened catalog item '{}'", script.item_text);
    page.wait_for_navigation(t).await?;

    // Subscribe before the click so the add-to-cart alert cannot slip past.
    page.dismiss_dialogs().await?;
    page.wait_for_visible(&s.add_to_cart, t).await?;
    page.click(&s.add_to_cart).await?;

    page.click(&s.cart_link).await?;
    page.wait_for_visible(&s.place_order, t).await?;
    page.click(&s.place_order).await?;

    page.wait_for_visible(&s.order_name, t).await?;
    debug!("order form visible");
    page.type_text(&s.order_name, &script.order.name).await?;
    page.type_text(&s.order_country, &script.order.country)
        .await?;
    page.type_text(&s.order_city, &script.order.city).await?;
    page.type_text(&s.order_card, &script.order.card).await?;
    page.type_text(&s.order_month, &script.order.month).await?;
    page.type_text(&s.order_year, &script.order.year).await?;

    page.click(&s.purchase).await?;
    page.wait_for_visible(&s.confirm_ok, t).await?;
    page.click(&s.confirm_ok).await?;
    info!("order confirmed");
    Ok(())
}
