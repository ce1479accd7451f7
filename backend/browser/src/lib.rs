//! Browser adapter for the fare pipeline.
//!
//! - [`locator`]: element locators and the structural path algorithm
//! - [`driver`]: the [`BrowserDriver`] capability contract
//! - [`page_control`]: [`CdpDriver`], a Chrome DevTools implementation
//! - [`scripted`]: [`ScriptedDriver`], an in-memory implementation for tests

pub mod cdp_client;
pub mod driver;
pub mod element_query;
pub mod error;
pub mod launch;
pub mod locator;
pub mod page_control;
pub mod scripted;

pub use cdp_client::CdpClient;
pub use driver::{BrowserDriver, NodeRef};
pub use error::DriverError;
pub use locator::{
    next_sibling_element, structural_path, Locator, PathSegment, QualifiedTag, StructuralNode,
    StructuralPath,
};
pub use page_control::{CdpDriver, CdpOptions};
pub use scripted::{DriverAction, ScriptedDriver};
