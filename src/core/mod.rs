pub mod handler;
pub mod lock;
pub mod mapping;

pub use crate::domain::model::{Acknowledgment, Cell, HeaderRow, OutputRow, Submission};
pub use crate::domain::ports::{Clock, ConfigProvider, SystemClock, TableStore};
pub use crate::utils::error::Result;
