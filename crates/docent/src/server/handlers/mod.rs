pub mod logs;
pub mod search;
pub mod sessions;
pub mod status;
