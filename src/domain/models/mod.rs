pub mod credential;
pub mod pagination;
pub mod repository;
pub mod run;
pub mod timeframe;
pub mod workflow;
