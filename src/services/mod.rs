pub mod accounts;
pub mod catalog;
pub mod recommendations;
pub mod reviews;
pub mod sessions;

pub use recommendations::Recommender;
pub use sessions::SessionStore;
