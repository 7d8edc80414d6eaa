mod flags;
mod preferences;
mod schema;
mod types;

pub use flags::{FlagStore, MemoryFlagStore};
pub use preferences::SESSION_CATEGORY_KEY;
pub use schema::Database;
pub use types::{DatabaseError, FlagSet};
