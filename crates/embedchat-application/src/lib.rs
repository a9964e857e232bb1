pub mod embed;
pub mod preview;
pub mod templates;

pub use embed::{DomEvent, EmbedHost, EmbeddedWidget, HostPage, HtmlPage, Mount};
pub use preview::PreviewHost;
pub use templates::embed_snippet;
