//! Stack capture at the panic site
//!
//! By the time `CatchPanicLayer` hands a payload to [`crate::envelope`],
//! the panicking frames are gone. A process-wide hook records the stack on
//! the panicking thread so the envelope middleware can attach it to the
//! raised failure.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static LAST_PANIC_STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Install the capturing hook, chained in front of the existing one
pub fn install() {
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let stack = Backtrace::force_capture().to_string();
            LAST_PANIC_STACK.with(|slot| *slot.borrow_mut() = Some(stack));
            previous(info);
        }));
    });
}

/// Stack of the latest panic on this thread, cleared once taken
pub fn take() -> Option<String> {
    LAST_PANIC_STACK.with(|slot| slot.borrow_mut().take())
}
