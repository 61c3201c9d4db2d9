mod repository;
pub mod rows;
pub mod schema;

pub use repository::Repository;
