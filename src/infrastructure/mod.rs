// Core infrastructure modules
pub mod database;          // Document store interface
pub mod id_generator;      // Snowflake document IDs
pub mod media_storage;     // Uploaded file storage
pub mod middleware;        // Viewer context middleware and extractor
pub mod security;          // Access tokens and password hashing
pub mod sqlite_database;   // SQLite document store
pub mod viewer;            // Viewer context

pub use database::DatabaseInterface;
pub use id_generator::IdGenerator;
pub use media_storage::{LocalMediaStorage, MediaStorage, MemoryMediaStorage, StoredMedia};
pub use middleware::{viewer_context_middleware, HasViewerAuth, Vc};
pub use security::{hash_password, verify_password, Claims, TokenService};
pub use sqlite_database::SqliteDatabase;
pub use viewer::ViewerContext;
