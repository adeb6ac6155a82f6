pub mod image_classifier;
pub mod image_loader;
pub mod location_reader;
