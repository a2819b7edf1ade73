//! Chat widget library exports for testing

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod core;
pub mod transport;
pub mod widget;

#[cfg(test)]
pub mod test_support;

/// How the widget is placed on its host surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Collapsed behind a toggle button until opened.
    #[default]
    Floating,
    /// Always open inside its container; no toggle animation.
    Embedded,
}
