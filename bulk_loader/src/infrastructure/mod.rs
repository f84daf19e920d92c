pub mod input;
pub mod sst;
