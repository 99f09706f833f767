pub mod errors;
pub mod external_apis;
pub mod formatting;
pub mod models;
