pub mod errors;
pub mod pagination;
pub mod use_cases;
