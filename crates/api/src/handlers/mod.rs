pub mod documents;
pub mod images;
