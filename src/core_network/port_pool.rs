use log::{debug, warn};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoolError {
    #[error("No free passive port left in range {0}-{1}")]
    Exhausted(u16, u16),
}

/// Process-wide allocator for passive data ports.
///
/// Ports are handed out lowest-first and never wrap around; a port stays
/// leased until its [`PortLease`] is released or dropped.
#[derive(Debug)]
pub struct PassivePortPool {
    range: RangeInclusive<u16>,
    leased: Mutex<BTreeSet<u16>>,
}

impl PassivePortPool {
    pub fn new(range: RangeInclusive<u16>) -> Arc<Self> {
        Arc::new(Self {
            range,
            leased: Mutex::new(BTreeSet::new()),
        })
    }

    pub fn range(&self) -> &RangeInclusive<u16> {
        &self.range
    }

    /// Leases the lowest free port of the range.
    pub fn lease(self: &Arc<Self>) -> Result<PortLease, PoolError> {
        let mut leased = self.leased.lock().unwrap_or_else(PoisonError::into_inner);

        let port = self
            .range
            .clone()
            .find(|port| !leased.contains(port))
            .ok_or_else(|| {
                warn!("Passive port pool {:?} exhausted", self.range);
                PoolError::Exhausted(*self.range.start(), *self.range.end())
            })?;

        leased.insert(port);
        debug!("Leased passive port {} ({} in use)", port, leased.len());

        Ok(PortLease {
            port,
            pool: Arc::clone(self),
        })
    }

    /// Returns `port` to the free set. Returns false if it was not leased.
    pub fn release(&self, port: u16) -> bool {
        let mut leased = self.leased.lock().unwrap_or_else(PoisonError::into_inner);
        let released = leased.remove(&port);
        if released {
            debug!("Released passive port {} ({} in use)", port, leased.len());
        }
        released
    }

    pub fn leased_count(&self) -> usize {
        self.leased
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A leased passive port, given back to the pool when dropped.
#[derive(Debug)]
pub struct PortLease {
    port: u16,
    pool: Arc<PassivePortPool>,
}

impl PortLease {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        self.pool.release(self.port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_leases_in_ascending_order() {
        let pool = PassivePortPool::new(2000..=2002);
        let a = pool.lease().unwrap();
        let b = pool.lease().unwrap();
        let c = pool.lease().unwrap();
        assert_eq!((a.port(), b.port(), c.port()), (2000, 2001, 2002));
    }

    #[test]
    fn test_exhaustion_and_release() {
        let pool = PassivePortPool::new(2000..=2001);
        let first = pool.lease().unwrap();
        let _second = pool.lease().unwrap();
        assert_eq!(pool.lease().unwrap_err(), PoolError::Exhausted(2000, 2001));

        let port = first.port();
        first.release();
        assert_eq!(pool.lease().unwrap().port(), port);
    }

    #[test]
    fn test_drop_releases_lease() {
        let pool = PassivePortPool::new(2000..=2000);
        {
            let _lease = pool.lease().unwrap();
            assert_eq!(pool.leased_count(), 1);
            assert!(pool.lease().is_err());
        }
        assert_eq!(pool.leased_count(), 0);
        assert_eq!(pool.lease().unwrap().port(), 2000);
    }

    #[test]
    fn test_no_wrapping_after_lower_port_is_freed() {
        let pool = PassivePortPool::new(2000..=2002);
        let a = pool.lease().unwrap();
        let _b = pool.lease().unwrap();
        drop(a);
        // The freed lowest port comes back before the untouched upper one.
        assert_eq!(pool.lease().unwrap().port(), 2000);
    }

    #[test]
    fn test_release_of_unleased_port() {
        let pool = PassivePortPool::new(2000..=2001);
        assert!(!pool.release(2000));
        assert!(!pool.release(9999));
    }

    #[test]
    fn test_concurrent_leases_are_distinct() {
        const N: u16 = 32;
        let pool = PassivePortPool::new(40000..=40000 + N - 1);

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.lease().unwrap())
            })
            .collect();
        let leases: Vec<PortLease> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let ports: HashSet<u16> = leases.iter().map(|l| l.port()).collect();
        assert_eq!(ports.len(), N as usize);
        assert!(ports.iter().all(|p| pool.range().contains(p)));
        assert!(matches!(pool.lease(), Err(PoolError::Exhausted(..))));
    }
}
