mod generative;
mod quantity;

pub use generative::{ExtractionMode, GenerativeExtractor};
pub use quantity::normalize_spoken_quantity;
