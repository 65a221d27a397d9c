mod classifier;
mod cuisine;

pub use classifier::{TagClassifier, VEGAN_TAG, VEGETARIAN_TAG};
pub use cuisine::CuisineHierarchy;
