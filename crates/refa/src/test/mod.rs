pub mod test_errors;
pub mod test_set;
pub mod test_window;
