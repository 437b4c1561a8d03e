pub mod medicine;
pub mod user;

pub use medicine::*;
pub use user::*;
