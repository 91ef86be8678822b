pub mod status;
pub mod unified;
