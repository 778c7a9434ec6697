pub mod dashboard;
pub mod detail;
