//! Pre-allocated buffer pool (spec.md §4.3 "Buffer pool").
//!
//! Rust's borrow checker cannot express "a view into buffer X is valid
//! until X is released" without unsafe code or a lifetime threaded through
//! the whole receiver -> logic -> sender pipeline. Slots are owned
//! `Vec<u8>`s; a borrow takes one out of the pool, the receiver moves it
//! into a `bytes::Bytes` (zero-copy) before decoding, and "release" — since
//! the original allocation is gone once it's inside an `Arc`-backed `Bytes`
//! — replenishes the pool with a fresh buffer of the configured size
//! (see DESIGN.md).

use tokio::sync::mpsc;

use crate::error::{Result, TransportError};

/// A buffer pool's static sizing (spec.md §4.3 defaults: 256 rx / 128 tx,
/// size 2048).
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub count: usize,
    pub buffer_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig { count: 256, buffer_size: 2048 }
    }
}

/// A bounded queue of `Vec<u8>` slots. Borrow blocks until a slot is
/// available or the pool is closed; release is idempotent.
pub struct BufferPool {
    tx: mpsc::Sender<Vec<u8>>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Vec<u8>>>,
    buffer_size: usize,
    closed: std::sync::atomic::AtomicBool,
}

impl BufferPool {
    pub fn new(config: PoolConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.count);
        for _ in 0..config.count {
            // a full channel never blocks a bounded send of its own capacity
            let _ = tx.try_send(vec![0u8; config.buffer_size]);
        }
        BufferPool { tx, rx: tokio::sync::Mutex::new(rx), buffer_size: config.buffer_size, closed: std::sync::atomic::AtomicBool::new(false) }
    }

    /// Borrows a slot, blocking until one is free or the pool is closed.
    pub async fn borrow(&self) -> Result<Vec<u8>> {
        if self.closed.load(std::sync::atomic::Ordering::Acquire) {
            return Err(TransportError::PoolClosed);
        }
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(TransportError::PoolClosed)
    }

    /// Returns a slot to the pool. Accepts any length (the release effect
    /// hands back a fresh buffer, not literally the one that was borrowed)
    /// and is a no-op once the pool is closed.
    pub fn release(&self, mut buf: Vec<u8>) {
        if self.closed.load(std::sync::atomic::Ordering::Acquire) {
            return;
        }
        buf.clear();
        buf.resize(self.buffer_size, 0);
        let _ = self.tx.try_send(buf);
    }

    /// Closes the pool: outstanding and future borrows fail with
    /// `PoolClosed` (spec.md §4.3: "close causes borrows to fail").
    pub fn close(&self) {
        self.closed.store(true, std::sync::atomic::Ordering::Release);
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn borrow_then_release_round_trips() {
        let pool = BufferPool::new(PoolConfig { count: 1, buffer_size: 16 });
        let buf = pool.borrow().await.unwrap();
        assert_eq!(buf.len(), 16);
        pool.release(buf);
        let buf2 = pool.borrow().await.unwrap();
        assert_eq!(buf2.len(), 16);
    }

    #[tokio::test]
    async fn closed_pool_rejects_borrow() {
        let pool = BufferPool::new(PoolConfig { count: 1, buffer_size: 16 });
        pool.close();
        assert!(matches!(pool.borrow().await, Err(TransportError::PoolClosed)));
    }

    #[tokio::test]
    async fn release_after_close_is_a_noop() {
        let pool = BufferPool::new(PoolConfig { count: 1, buffer_size: 16 });
        let buf = pool.borrow().await.unwrap();
        pool.close();
        pool.release(buf); // must not panic
    }
}
