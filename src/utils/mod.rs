pub mod log;
pub mod test_utils;
