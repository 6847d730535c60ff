pub mod client;
pub mod favorite;
pub mod types;
