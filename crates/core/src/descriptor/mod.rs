pub mod face_descriptor;
pub mod similarity_comparator;
