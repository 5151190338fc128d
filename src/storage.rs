mod filesystem;
mod state;
mod traits;

pub use filesystem::{render_index, FilesystemRegistry};
pub use state::RegistryState;
pub use traits::RegistryStore;
