pub mod constants;
pub mod password;
pub mod types;
pub mod validation;
