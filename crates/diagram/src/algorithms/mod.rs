pub mod preprocessing;
pub mod contours;
pub mod lines;
pub mod circles;

pub use preprocessing::*;
pub use contours::*;
pub use lines::*;
pub use circles::*;
