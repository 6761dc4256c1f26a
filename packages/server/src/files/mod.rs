//! Encrypted file storage: records, access rules and the service that ties
//! the blob store, metadata store and cipher together.

mod error;
mod memory;
mod metadata;
pub mod policy;
mod record;
mod service;

pub use error::{FileError, MetadataError};
pub use memory::MemoryMetadataStore;
pub use metadata::{DbMetadataStore, MetadataStore};
pub use record::{DownloadedFile, FileRecord, FileView, NewFileRecord, NewUpload, Principal, Visibility};
pub use service::FileService;
