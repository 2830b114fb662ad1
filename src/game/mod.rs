pub mod players;
pub mod session;
