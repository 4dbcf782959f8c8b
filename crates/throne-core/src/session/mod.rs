mod model;
mod storage;
mod store;

pub use model::{derive_title, Message, Session, SessionExport};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{generate_device_id, SessionStore};
