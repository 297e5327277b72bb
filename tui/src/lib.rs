//! Terminal front end: landing form, generation progress and slide preview.

pub mod app;
pub mod app_event_sender;
mod generating;
mod landing;
pub mod preview;
pub mod widgets;

use std::sync::Arc;

use deck_core::{Backend, Config};

pub use app::{run_app, App, Focus};

/// Run the interactive UI until the user quits.
pub async fn run_interactive(config: Config, backend: Arc<dyn Backend>) -> anyhow::Result<()> {
    run_app(config, backend).await
}
