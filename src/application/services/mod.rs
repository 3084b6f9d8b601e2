//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, KeyValueStore, Prompt)
//! but are themselves concrete structs, not traits.

mod interchange;
mod library;
mod session;
mod tree;

pub use interchange::InterchangeService;
pub use library::{LibraryService, SaveOutcome};
pub use session::SessionService;
pub use tree::{NodeValidation, TreeService};
