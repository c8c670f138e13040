//! Console output for check runs

pub mod i18n;
pub mod progress;
mod reporter;

pub use i18n::{Catalog, Locale, Message};
pub use progress::{track, Progress, Silent, Spinner};
pub use reporter::Reporter;
