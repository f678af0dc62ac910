pub use element::*;
pub use nac::*;
pub use overlap::*;

pub mod element;
pub mod nac;
pub mod overlap;
