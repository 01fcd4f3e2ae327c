pub mod admin;
pub mod content;
pub mod credits;
pub mod health;
pub mod keywords;
pub mod metrics;
pub mod referral;
