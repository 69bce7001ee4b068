use std::time::Duration;
use tokio::time::Instant;

/// Proof of a successful acquisition; releases only the lock it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Idle,
    Locked { token: LockToken, expires_at: Instant },
}

/// Result of [`TimedLock::try_acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Acquired(LockToken),
    /// The previous holder outlived its timeout and was evicted
    Recovered(LockToken),
    Held,
}

impl Acquire {
    pub fn token(self) -> Option<LockToken> {
        match self {
            Acquire::Acquired(token) | Acquire::Recovered(token) => Some(token),
            Acquire::Held => None,
        }
    }
}

/// Single-flight lock with a bounded hold time
///
/// `Idle -> Locked(expires_at) -> Idle`. A holder that never releases is
/// evicted by the first acquisition attempt after `expires_at`; its token
/// is then stale and its `release` is a no-op.
#[derive(Debug, Clone)]
pub struct TimedLock {
    state: LockState,
    timeout: Duration,
    next_token: u64,
}

impl TimedLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: LockState::Idle,
            timeout,
            next_token: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_held(&self, now: Instant) -> bool {
        matches!(self.state, LockState::Locked { expires_at, .. } if now < expires_at)
    }

    pub fn try_acquire(&mut self, now: Instant) -> Acquire {
        let recovered = match self.state {
            LockState::Idle => false,
            LockState::Locked { expires_at, .. } if now >= expires_at => true,
            LockState::Locked { .. } => return Acquire::Held,
        };

        self.next_token += 1;
        let token = LockToken(self.next_token);
        self.state = LockState::Locked {
            token,
            expires_at: now + self.timeout,
        };

        if recovered {
            tracing::warn!("Lock expired after {:?} without release, recovering", self.timeout);
            Acquire::Recovered(token)
        } else {
            Acquire::Acquired(token)
        }
    }

    /// Release if `token` is the current holder
    pub fn release(&mut self, token: LockToken) -> bool {
        match self.state {
            LockState::Locked { token: held, .. } if held == token => {
                self.state = LockState::Idle;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_cycle() {
        let now = Instant::now();
        let mut lock = TimedLock::new(Duration::from_millis(300));
        let token = lock.try_acquire(now).token().unwrap();
        assert!(lock.is_held(now));
        assert_eq!(lock.try_acquire(now + Duration::from_millis(10)), Acquire::Held);
        assert!(lock.release(token));
        assert_eq!(lock.state(), LockState::Idle);
        assert!(matches!(lock.try_acquire(now), Acquire::Acquired(_)));
    }

    #[test]
    fn test_expired_holder_is_evicted() {
        let now = Instant::now();
        let mut lock = TimedLock::new(Duration::from_millis(300));
        let stale = lock.try_acquire(now).token().unwrap();
        assert_eq!(lock.try_acquire(now + Duration::from_millis(299)), Acquire::Held);

        let fresh = match lock.try_acquire(now + Duration::from_millis(300)) {
            Acquire::Recovered(token) => token,
            other => panic!("expected recovery, got {:?}", other),
        };
        assert!(!lock.release(stale));
        assert!(lock.is_held(now + Duration::from_millis(301)));
        assert!(lock.release(fresh));
    }
}
