//! Recipe Pipeline - Entry Point
//!
//! Minimal entry point that delegates to the commands module.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    recipe_pipeline::run().await
}
