pub mod activity;
pub mod aggregation;
pub mod beneficiary;
pub mod core;
pub mod dashboard;
pub mod export;
pub mod indicator;
pub mod map;
pub mod project;
pub mod report;
