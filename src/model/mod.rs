pub mod config;
pub mod line;
pub mod outline;
pub mod selection;
pub mod tag;
pub mod traverse;

pub use config::*;
pub use line::*;
pub use outline::*;
pub use selection::*;
pub use tag::*;
