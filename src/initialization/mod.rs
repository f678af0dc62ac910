pub use io::*;

pub mod io;
