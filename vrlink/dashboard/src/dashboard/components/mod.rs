mod connections;
mod logs;
mod notifications;
mod settings;
mod settings_controls;
mod statistics;

pub use connections::*;
pub use logs::*;
pub use notifications::*;
pub use settings::*;
pub use settings_controls::*;
pub use statistics::*;
