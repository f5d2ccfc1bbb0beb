//! # Libris Backend Entry Point
//!
//! The setup lives in lib.rs for testability.

#[tokio::main]
async fn main() -> std::io::Result<()> {
    libris_desktop_lib::run().await
}
