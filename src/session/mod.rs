pub mod response;
pub mod state;
pub mod summary;

pub use response::*;
pub use state::*;
pub use summary::*;
