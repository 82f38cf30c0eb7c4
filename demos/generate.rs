//! Submits one request to a running server and saves the result.
//!
//! Run with:
//! `cargo run --example generate -- "a watercolor fox" 1024x1024 [base_image.png]`
//!
//! `RIMAGEN_URL` overrides the server address (default `http://127.0.0.1:5000`).

use rimagen::{image_file_to_data_url, GenerationRequest, ImageSize, ImagenClient};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    rimagen::logger::init()?;

    let mut args = env::args().skip(1);
    let prompt = args.next().ok_or("usage: generate <prompt> [size] [base_image]")?;
    let size = match args.next() {
        Some(size) => size.parse::<ImageSize>().map_err(|issue| issue.message)?,
        None => ImageSize::default(),
    };
    let base_image = args
        .next()
        .map(|path| image_file_to_data_url(path))
        .transpose()?;

    let base_url = env::var("RIMAGEN_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let client = ImagenClient::new(base_url)?;

    for option in client.sizes().await? {
        log::debug!("  {} - {}", option.label, option.description);
    }

    let request = GenerationRequest::new(prompt, size, base_image)?;
    let image = client.generate(&request).await?;
    let path = image.save_in(".")?;

    println!("{}", path.display());
    Ok(())
}
