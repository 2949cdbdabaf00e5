pub mod models;

pub use models::{ClassificationRecord, Label, UnknownLabel};
