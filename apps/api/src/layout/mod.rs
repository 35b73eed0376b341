// Layout: static font metrics, style sheets, page geometry and the shared
// wrap-and-paginate engine used by every output backend.
// Pure and CPU-bound; the HTTP handlers call it inside tokio::task::spawn_blocking.

pub mod embedded_font;
pub mod engine;
pub mod font_metrics;
pub mod page;
pub mod style;

pub use page::PageSetup;
pub use style::{StyleCatalog, StyleSheet};
