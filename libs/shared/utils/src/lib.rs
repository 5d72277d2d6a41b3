pub mod dates;
pub mod test_support;
pub mod times;
