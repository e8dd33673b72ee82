//! flatsheet-core - named sheet instances, CSV persistence and sheet operations.

pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod storage;
pub mod workspace;

pub use config::StoreConfig;
pub use document::Sheet;
pub use error::{Result, SheetError};
pub use model::{Request, Response, SheetChange, SortOrder};
pub use workspace::Workspace;

pub use flatsheet_engine::engine::CellRef;
