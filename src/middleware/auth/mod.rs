pub mod carriers;
pub mod session;
