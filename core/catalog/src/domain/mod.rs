//! catalog 固有のドメイン型（型と不変条件）

pub mod category;
pub mod command;
pub mod editor_state;
pub mod error;
pub mod ids;
pub mod part;
pub mod source;

pub use category::{filter_categories, Category, PartSummary};
pub use command::{CatalogCommand, EditOp};
pub use editor_state::{EditField, EditorState};
pub use error::CatalogError;
pub use ids::{CategoryId, PartId, RevisionLabel, Ticket, TicketCounter};
pub use part::{diff_fields, FieldChange, FieldMap, FieldValue, NewPart, Part, PartUpdate};
pub use source::SourceRecord;
