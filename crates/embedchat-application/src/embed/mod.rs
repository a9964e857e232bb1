//! Public host adapter: the floating widget injected into third-party pages.

mod host;
mod page;

pub use host::{DEFAULT_TITLE, DomEvent, EmbedHost, EmbeddedWidget, EventOutcome, Mount};
pub use page::{HostPage, HtmlPage};
