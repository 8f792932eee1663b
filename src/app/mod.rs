mod state;

pub use state::{App, ReloadOutcome};
