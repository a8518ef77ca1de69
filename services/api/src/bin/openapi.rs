//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the REST endpoints (catalog, notes, image
//! analysis) to `openapi.json`, or to the path given as the first argument.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let document = ApiDoc::openapi();
    let paths = document.paths.paths.len();
    std::fs::write(&path, document.to_pretty_json()?)?;

    println!("✅ OpenAPI specification with {} paths generated at {}", paths, path);
    Ok(())
}
