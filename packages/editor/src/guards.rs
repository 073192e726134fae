//! Transient guard flags of one node view
//!
//! `accepts_widget_event` is the single gate for widget-originated changes:
//!
//! | ready | initial_load | sync_in_progress | destroyed | accepted |
//! |-------|--------------|------------------|-----------|----------|
//! | false | *            | *                | *         | no       |
//! | true  | true         | *                | *         | no       |
//! | true  | false        | true             | *         | no       |
//! | true  | false        | false            | true      | no       |
//! | true  | false        | false            | false     | yes      |
//!
//! `dirty` and `commit_pending` do not gate events; they gate snapshots.

/// Never persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardSet {
    pub ready: bool,
    /// Widget changed since the last snapshot
    pub dirty: bool,
    /// A debounced commit is scheduled
    pub commit_pending: bool,
    pub initial_load: bool,
    /// Data is being pushed into the widget
    pub sync_in_progress: bool,
    pub destroyed: bool,
}

impl GuardSet {
    /// State right after binding, before the initial load
    pub fn binding() -> Self {
        Self::default()
    }

    pub fn accepts_widget_event(&self) -> bool {
        self.ready && !self.initial_load && !self.sync_in_progress && !self.destroyed
    }

    /// Idle and interactive: nothing pending, nothing loading
    pub fn is_idle(&self) -> bool {
        self.accepts_widget_event() && !self.dirty && !self.commit_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_table() {
        let bools = [false, true];
        for ready in bools {
            for initial_load in bools {
                for sync_in_progress in bools {
                    for destroyed in bools {
                        for dirty in bools {
                            let guards = GuardSet {
                                ready,
                                dirty,
                                commit_pending: dirty,
                                initial_load,
                                sync_in_progress,
                                destroyed,
                            };
                            let expected =
                                ready && !initial_load && !sync_in_progress && !destroyed;
                            assert_eq!(guards.accepts_widget_event(), expected, "{:?}", guards);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_binding_state_rejects_events() {
        let guards = GuardSet::binding();
        assert!(!guards.ready);
        assert!(!guards.accepts_widget_event());
        assert!(!guards.is_idle());
    }

    #[test]
    fn test_idle() {
        let mut guards = GuardSet {
            ready: true,
            ..Default::default()
        };
        assert!(guards.is_idle());
        guards.commit_pending = true;
        assert!(guards.accepts_widget_event());
        assert!(!guards.is_idle());
    }
}
