pub mod error;
pub mod shutdown;

pub use error::{AppError, AudioError};
pub use shutdown::ShutdownToken;
