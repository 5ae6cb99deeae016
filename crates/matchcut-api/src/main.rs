//! Matchcut API server binary

mod api_doc;
mod error;
mod handlers;
mod job_queue;
mod setup;
mod state;
mod utils;

use matchcut_core::Config;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;
    let app = setup::initialize_app(config.clone()).await?;
    setup::server::start_server(&config, app).await
}
