pub mod batch;
pub mod manager;
pub mod schema;
pub mod search;

#[cfg(test)]
mod tests;

pub use batch::batch_add_documents;
pub use manager::IndexManager;
pub use schema::IndexSchema;
pub use search::search;
