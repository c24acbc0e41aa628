pub mod chart;
pub mod price;
pub mod signals;

pub use chart::*;
pub use price::*;
pub use signals::*;
