//! Admission control for shutdown.
//!
//! The closing flag and the number of live calls share one watch cell, so
//! checking the flag and registering a call is a single atomic step and no
//! call can slip in once draining has started.

use tokio::sync::watch;

#[derive(Debug, Default, Clone, Copy)]
struct Lifecycle {
    closing: bool,
    in_flight: usize,
}

pub(crate) struct Gate {
    state: watch::Sender<Lifecycle>,
}

/// A live call. Dropping it releases the slot.
pub(crate) struct Pass<'a> {
    gate: &'a Gate,
}

impl Gate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Lifecycle::default());
        Self { state }
    }

    /// Registers a call unless the gate is closing.
    pub fn admit(&self) -> Option<Pass<'_>> {
        let admitted = self.state.send_if_modified(|s| {
            if s.closing {
                return false;
            }
            s.in_flight += 1;
            true
        });
        admitted.then_some(Pass { gate: self })
    }

    /// Stops admitting calls. Returns false if already closing.
    pub fn close(&self) -> bool {
        self.state.send_if_modified(|s| {
            let first = !s.closing;
            s.closing = true;
            first
        })
    }

    pub fn is_closing(&self) -> bool {
        self.state.borrow().closing
    }

    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight
    }

    /// Resolves once no call is live.
    pub async fn drained(&self) {
        let mut rx = self.state.subscribe();
        // The sender is owned by self, so the channel cannot close here.
        let _ = rx.wait_for(|s| s.in_flight == 0).await;
    }
}

impl Drop for Pass<'_> {
    fn drop(&mut self) {
        self.gate.state.send_modify(|s| s.in_flight -= 1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn closed_gate_rejects() {
        let gate = Gate::new();
        let pass = gate.admit();
        assert!(pass.is_some());
        assert_eq!(gate.in_flight(), 1);

        assert!(gate.close());
        assert!(!gate.close());
        assert!(gate.is_closing());
        assert!(gate.admit().is_none());
        assert_eq!(gate.in_flight(), 1);

        drop(pass);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn drained_waits_for_passes() {
        let gate = Gate::new();
        gate.drained().await;

        let pass = gate.admit().unwrap();
        gate.close();
        let gate = &gate;
        let drained = async move {
            gate.drained().await;
            gate.in_flight()
        };
        let release = async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(pass);
        };
        let (live_at_drain, ()) = tokio::join!(drained, release);
        assert_eq!(live_at_drain, 0);
    }
}
