pub mod logging;

pub use ::anyhow;
pub use ::log;
pub use logging::*;
pub use parking_lot;

pub use ::anyhow::{anyhow, bail, Context, Result};
pub use ::log::{debug, error, info, warn};

use std::sync::atomic::{AtomicBool, Ordering};

// Simple wrapper for AtomicBool when routine memory ordering is not needed
pub struct RelaxedAtomic(AtomicBool);

impl RelaxedAtomic {
    pub const fn new(initial_value: bool) -> Self {
        Self(AtomicBool::new(initial_value))
    }

    pub fn value(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}

pub const VRLINK_NAME: &str = "vrlink";

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_half(value: u32) -> Result<u32> {
        if value % 2 != 0 {
            bail!("{value} is odd");
        }

        Ok(value / 2)
    }

    #[test]
    fn error_helpers_are_reexported() {
        assert_eq!(checked_half(4).unwrap(), 2);

        let e = checked_half(3).context("halving").unwrap_err();
        assert_eq!(format!("{e:#}"), "halving: 3 is odd");

        let e: anyhow::Error = anyhow!("plain");
        assert_eq!(e.to_string(), "plain");
    }
}
