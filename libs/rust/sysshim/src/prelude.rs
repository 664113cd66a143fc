pub use crate::error::Error;
pub use crate::handle::HandleId;
pub use crate::handle::Handleable;
pub use crate::handle::OwnedHandle;
pub use crate::log::debug;
pub use crate::log::error;
pub use crate::log::info;
pub use crate::log::trace;
pub use crate::log::warn;
