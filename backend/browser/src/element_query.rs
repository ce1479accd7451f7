//! Element Queries
//!
//! Translates a [`Locator`] into the JavaScript expression that resolves it
//! inside the page, so every locator strategy goes through one code path.

use serde_json::Value;

use crate::locator::Locator;

/// Expression evaluating to the first matching element, or `null`.
pub fn resolve_expression(locator: &Locator) -> String {
    match locator {
        Locator::ByName(name) => {
            format!("document.getElementsByName({})[0] ?? null", js_string(name))
        }
        Locator::ByClass(class) => format!(
            "document.getElementsByClassName({})[0] ?? null",
            js_string(class)
        ),
        Locator::ByCss(css) => format!("document.querySelector({})", js_string(css)),
        Locator::ByStructuralPath(path) => format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(&path.to_string())
        ),
    }
}

/// Function applied to a resolved element to click it.
pub const CLICK_FUNCTION: &str =
    "function() { this.scrollIntoView({ block: 'center' }); this.click(); }";

/// Function applied to a resolved input before text is inserted.
pub const FOCUS_AND_CLEAR_FUNCTION: &str =
    "function() { this.focus(); if ('value' in this) { this.value = ''; } }";

/// Expression returning the serialized document.
pub const OUTER_HTML_EXPRESSION: &str = "document.documentElement.outerHTML";

/// Expression returning the document's ready state.
pub const READY_STATE_EXPRESSION: &str = "document.readyState";

/// Quote `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
