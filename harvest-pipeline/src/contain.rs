//! Containment of feature-supplied code.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use eyre::{Result, eyre};

/// Run feature code, turning a panic into an ordinary error.
///
/// Feature state is only read through shared references, so observing it
/// after an unwind cannot expose a broken invariant of the pipeline.
pub(crate) fn contain<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(eyre!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
