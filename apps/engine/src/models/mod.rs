pub mod document;
pub mod user;

pub use document::{Document, DocumentId, SourceFormat};
pub use user::UserProfile;
