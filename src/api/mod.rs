pub mod analytics;
pub mod health;
pub mod rewards;
pub mod session;
pub mod weights;
