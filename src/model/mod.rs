//! Domain model of the content repository.
//!
//! A repository holds one folder per library (keyed by the library's integer
//! id), a `global/` folder for library-independent entities, and a
//! `mappings/` folder whose filenames encode relationships positionally.

mod entities;
mod entity_type;
mod path_info;

pub use entities::*;
pub use entity_type::*;
pub use path_info::*;
