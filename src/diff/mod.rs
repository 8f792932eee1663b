mod controller;
mod group;
mod loader;
mod model;
mod moves;
mod prepare;

pub use controller::{build_presentation, DiffPresentation};
pub use group::{DiffMode, PresentationGroup};
pub use loader::{load_response, parse_response};
pub use model::{DiffKind, DiffLine, DiffResponse, HighlightKind};
pub use prepare::SectionOverride;
