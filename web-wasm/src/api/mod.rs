pub mod download;
pub mod pms;
