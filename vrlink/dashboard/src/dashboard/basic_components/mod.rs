mod button_group;
mod switch;

pub use button_group::*;
pub use switch::*;
