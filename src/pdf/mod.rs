pub mod backend;
pub mod document;
pub mod tools;

pub use backend::{DocumentBackend, Rotation};
pub use document::LopdfBackend;
