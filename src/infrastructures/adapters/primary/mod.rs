pub mod session;
pub mod web;
