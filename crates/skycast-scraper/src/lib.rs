pub mod assemble;
pub mod client;
pub mod document;
pub mod error;
pub mod extract;
pub mod normalize;

pub use assemble::{assemble_record, scrape_weather, validate_selectors};
pub use client::WeatherClient;
pub use document::{Document, HtmlDocument};
pub use error::{ExtractionError, FieldError, ScraperError};
pub use extract::extract_field;
pub use normalize::{normalize_pressure, split_humidity_pressure, split_min_max_temperature};
