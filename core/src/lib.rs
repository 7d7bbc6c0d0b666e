pub mod db;
pub mod export;
pub mod grocery;
pub mod models;
pub mod plan;
pub mod units;
