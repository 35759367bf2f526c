use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Self-rescheduling frame task with a single cancellation point.
///
/// At most one frame is pending at a time. Once cancelled the loop never
/// schedules again, and a handle taken before the cancellation is not
/// rescheduled when it completes.
#[derive(Debug, Default)]
pub struct RenderLoop {
    next_id: u64,
    pending: Option<FrameHandle>,
    cancelled: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn start(&mut self) -> Option<FrameHandle> {
        if self.cancelled {
            return None;
        }
        if self.pending.is_none() {
            self.pending = Some(self.allocate());
        }
        self.pending
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled && self.pending.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn take_due(&mut self) -> Option<FrameHandle> {
        if self.cancelled {
            return None;
        }
        self.pending.take()
    }

    pub fn complete(&mut self, handle: FrameHandle) -> Option<FrameHandle> {
        self.frames += 1;
        if self.cancelled {
            debug!(frame = handle.0, "render loop cancelled; not rescheduling");
            return None;
        }
        let next = self.allocate();
        self.pending = Some(next);
        Some(next)
    }

    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        self.pending = None;
        true
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    fn allocate(&mut self) -> FrameHandle {
        self.next_id += 1;
        FrameHandle(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_reschedule_until_cancelled() {
        let mut lp = RenderLoop::default();
        assert!(lp.start().is_some());
        for _ in 0..3 {
            let handle = lp.take_due().unwrap();
            assert!(lp.complete(handle).is_some());
        }
        assert_eq!(lp.frame_count(), 3);
        assert!(lp.cancel());
        assert!(!lp.cancel());
        assert!(lp.take_due().is_none());
        assert!(lp.start().is_none());
        assert_eq!(lp.frame_count(), 3);
    }

    #[test]
    fn in_flight_frame_is_not_rescheduled_after_cancel() {
        let mut lp = RenderLoop::default();
        lp.start();
        let handle = lp.take_due().unwrap();
        lp.cancel();
        assert!(lp.complete(handle).is_none());
        assert!(!lp.is_running());
    }

    #[test]
    fn start_is_idempotent() {
        let mut lp = RenderLoop::default();
        let first = lp.start();
        assert_eq!(lp.start(), first);
    }
}
