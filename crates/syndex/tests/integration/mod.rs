mod cascade;
mod substring;
mod tantivy_backend;
