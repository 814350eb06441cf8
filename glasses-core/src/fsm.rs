//! Minimal finite state machine.
//!
//! States are usually the variants of one enum implementing [`State`]. The
//! machine owns at most one active state and drives its lifecycle:
//! `enter` once when installed, `update` every cycle, `transition` when asked,
//! and `exit` once before the state is dropped.
//!
//! # Example
//!
//! ```
//! use glasses_core::{Fsm, State};
//!
//! enum Blink {
//!     On { left_ms: u32 },
//!     Off,
//! }
//!
//! impl State for Blink {
//!     type Context = bool;
//!
//!     fn enter(&mut self, led: &mut bool) {
//!         *led = matches!(self, Blink::On { .. });
//!     }
//!
//!     fn update(&mut self, _led: &mut bool, dt_ms: u32) {
//!         if let Blink::On { left_ms } = self {
//!             *left_ms = left_ms.saturating_sub(dt_ms);
//!         }
//!     }
//!
//!     fn transition(&mut self, _led: &mut bool) -> Option<Self> {
//!         match self {
//!             Blink::On { left_ms: 0 } => Some(Blink::Off),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut led = false;
//! let mut fsm = Fsm::new();
//! fsm.goto_state(&mut led, Some(Blink::On { left_ms: 100 }));
//! assert!(led);
//! fsm.update(&mut led, 100);
//! assert!(fsm.transition(&mut led));
//! assert!(!led);
//! ```

/// Lifecycle hooks of a state. All hooks default to no-ops.
pub trait State: Sized {
    /// Data the hooks operate on, passed in by the machine's owner.
    type Context;

    fn enter(&mut self, _ctx: &mut Self::Context) {}

    fn update(&mut self, _ctx: &mut Self::Context, _dt_ms: u32) {}

    /// Return the next state to move to, or `None` to stay.
    fn transition(&mut self, _ctx: &mut Self::Context) -> Option<Self> {
        None
    }

    fn exit(&mut self, _ctx: &mut Self::Context) {}
}

/// Owner of the active state.
///
/// A new machine has no state. Dropping the machine drops the active state
/// without calling `exit`; use [`shutdown`](Self::shutdown) when the context
/// is still available.
#[derive(Debug)]
pub struct Fsm<S: State> {
    current: Option<S>,
}

impl<S: State> Fsm<S> {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Exit and drop the active state, then install and enter `next`.
    pub fn goto_state(&mut self, ctx: &mut S::Context, next: Option<S>) {
        if let Some(mut old) = self.current.take() {
            old.exit(ctx);
        }
        self.current = next;
        if let Some(state) = self.current.as_mut() {
            state.enter(ctx);
        }
    }

    /// Forward `dt_ms` to the active state.
    pub fn update(&mut self, ctx: &mut S::Context, dt_ms: u32) {
        if let Some(state) = self.current.as_mut() {
            state.update(ctx, dt_ms);
        }
    }

    /// Ask the active state for a successor and switch to it.
    ///
    /// Returns `true` if the state changed.
    pub fn transition(&mut self, ctx: &mut S::Context) -> bool {
        match self.current.as_mut().and_then(|state| state.transition(ctx)) {
            Some(next) => {
                self.goto_state(ctx, Some(next));
                true
            }
            None => false,
        }
    }

    /// Exit and drop the active state, leaving the machine empty.
    pub fn shutdown(&mut self, ctx: &mut S::Context) {
        self.goto_state(ctx, None);
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl<S: State> Default for Fsm<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    #[derive(Debug, PartialEq)]
    enum Test {
        A,
        B,
        Counting(u32),
    }

    type Log = Vec<(&'static str, &'static str)>;

    fn name(state: &Test) -> &'static str {
        match state {
            Test::A => "A",
            Test::B => "B",
            Test::Counting(_) => "C",
        }
    }

    impl State for Test {
        type Context = Log;

        fn enter(&mut self, log: &mut Log) {
            log.push(("enter", name(self)));
        }

        fn update(&mut self, log: &mut Log, dt_ms: u32) {
            log.push(("update", name(self)));
            if let Test::Counting(total) = self {
                *total += dt_ms;
            }
        }

        fn transition(&mut self, _log: &mut Log) -> Option<Self> {
            match self {
                Test::Counting(total) if *total >= 10 => Some(Test::A),
                _ => None,
            }
        }

        fn exit(&mut self, log: &mut Log) {
            log.push(("exit", name(self)));
        }
    }

    #[test]
    fn test_goto_state_order() {
        let mut log = Log::new();
        let mut fsm = Fsm::new();
        fsm.goto_state(&mut log, Some(Test::A));
        fsm.goto_state(&mut log, Some(Test::B));
        fsm.update(&mut log, 1);
        assert_eq!(
            log,
            vec![("enter", "A"), ("exit", "A"), ("enter", "B"), ("update", "B")]
        );
    }

    #[test]
    fn test_empty_machine_is_noop() {
        let mut log = Log::new();
        let mut fsm: Fsm<Test> = Fsm::new();
        fsm.update(&mut log, 5);
        assert!(!fsm.transition(&mut log));
        assert!(!fsm.is_active());
        assert!(log.is_empty());
    }

    #[test]
    fn test_transition() {
        let mut log = Log::new();
        let mut fsm = Fsm::new();
        fsm.goto_state(&mut log, Some(Test::Counting(0)));
        fsm.update(&mut log, 4);
        assert!(!fsm.transition(&mut log));
        fsm.update(&mut log, 6);
        assert!(fsm.transition(&mut log));
        assert_eq!(fsm.current(), Some(&Test::A));
        assert_eq!(log.last(), Some(&("enter", "A")));
    }

    #[test]
    fn test_goto_none_and_shutdown() {
        let mut log = Log::new();
        let mut fsm = Fsm::new();
        fsm.goto_state(&mut log, Some(Test::B));
        fsm.goto_state(&mut log, None);
        assert!(!fsm.is_active());
        assert_eq!(log, vec![("enter", "B"), ("exit", "B")]);

        fsm.goto_state(&mut log, Some(Test::A));
        fsm.shutdown(&mut log);
        assert_eq!(log.last(), Some(&("exit", "A")));
        fsm.shutdown(&mut log);
        assert_eq!(log.len(), 4);
    }

    struct Tracked(Rc<RefCell<Vec<&'static str>>>);

    impl State for Tracked {
        type Context = ();
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.borrow_mut().push("drop");
        }
    }

    #[test]
    fn test_replaced_and_owned_states_are_dropped() {
        let drops = Rc::new(RefCell::new(Vec::new()));
        let mut fsm = Fsm::new();
        fsm.goto_state(&mut (), Some(Tracked(drops.clone())));
        fsm.goto_state(&mut (), Some(Tracked(drops.clone())));
        assert_eq!(drops.borrow().len(), 1);
        drop(fsm);
        assert_eq!(drops.borrow().len(), 2);
    }
}
