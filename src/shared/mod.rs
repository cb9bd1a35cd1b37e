pub mod device;
pub mod inference;
