use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(
    result: LockResult<G>,
    target: &'static str,
    op: &'static str,
    lock_kind: &'static str,
) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op,
            target_module = target,
            lock_kind,
            result = "poisoned_recovered",
            "Recovered from poisoned lock"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), target, op, "rwlock.read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), target, op, "rwlock.write")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn poisoned_lock_is_recovered() {
        let lock = Arc::new(RwLock::new(1_u32));
        let cloned = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.write().expect("first write");
            panic!("poison the lock");
        })
        .join();

        assert!(lock.is_poisoned());
        *rw_write(&lock, "cache::lock::tests", "write") += 1;
        assert_eq!(*rw_read(&lock, "cache::lock::tests", "read"), 2);
    }
}
