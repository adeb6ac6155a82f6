pub mod corpus_walker;
pub mod exif_location_reader;
pub mod image_file_loader;
pub mod sniffing_image_classifier;
