//! SQLite database session implementation

mod connection;
mod grid;
mod session;
pub mod templates;

pub use connection::{
    ConnectionOptions, DatabaseFileInfo, QueryOutput, SqliteConnection, expand_path,
    quote_identifier,
};
pub use grid::{GridColumn, GridColumns, grid_columns, project};
pub use session::{APP_TITLE, DatabaseSession, is_select};
