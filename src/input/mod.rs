pub mod types;
pub use types::{InputEvent, Modifier};

pub mod encode;
