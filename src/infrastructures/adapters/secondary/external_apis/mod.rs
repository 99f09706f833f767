pub mod github;
pub mod request_client;
