pub mod authorizer;
pub mod clock;
pub mod identity;
pub mod session;
