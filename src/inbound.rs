//! Inbound radio packet queue (reception-context → main loop).
//!
//! The ESP-NOW receive callback runs outside the main loop.  It copies each
//! packet into a bounded FIFO guarded by a critical section; the main loop
//! drains it once per tick.  This queue is the only state the reception
//! context writes.
//!
//! ```text
//! ┌──────────────┐ push  ┌───────────────────┐ drain ┌──────────────┐
//! │ ESP-NOW recv │──────▶│  InboundQueue<N>  │──────▶│  Main loop   │
//! │  callback    │       │ (critical section)│       │  (router)    │
//! └──────────────┘       └───────────────────┘       └──────────────┘
//! ```
//!
//! When full, the **newest** packet is dropped and counted; queued packets
//! are never overwritten.  The critical section covers only the index update
//! and a fixed-size copy.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{Deque, Vec};

use crate::link::RADIO_MTU;

/// Number of packets buffered between reception and the main loop.
pub const INBOUND_CAPACITY: usize = 8;

/// One raw radio packet.
pub type Packet = Vec<u8, RADIO_MTU>;

struct Inner<const N: usize> {
    queue: Deque<Packet, N>,
    dropped: u32,
}

/// Bounded drop-newest FIFO safe to push from the reception context.
pub struct InboundQueue<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<N>>>,
}

impl<const N: usize> Default for InboundQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> InboundQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                queue: Deque::new(),
                dropped: 0,
            })),
        }
    }

    /// Enqueue a copy of `data`.
    ///
    /// Returns `false` if the packet was dropped (queue full or oversized).
    pub fn push(&self, data: &[u8]) -> bool {
        let Ok(packet) = Packet::from_slice(data) else {
            self.count_drop();
            return false;
        };
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.queue.push_back(packet).is_err() {
                inner.dropped = inner.dropped.wrapping_add(1);
                false
            } else {
                true
            }
        })
    }

    /// Dequeue the oldest packet.
    pub fn pop(&self) -> Option<Packet> {
        self.inner.lock(|cell| cell.borrow_mut().queue.pop_front())
    }

    /// Pop until empty, handing each packet to `handler` outside the
    /// critical section.
    pub fn drain(&self, mut handler: impl FnMut(&[u8])) {
        while let Some(packet) = self.pop() {
            handler(&packet);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packets dropped since boot.
    pub fn dropped(&self) -> u32 {
        self.inner.lock(|cell| cell.borrow().dropped)
    }

    fn count_drop(&self) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            inner.dropped = inner.dropped.wrapping_add(1);
        });
    }
}

/// Queue fed by the ESP-NOW receive callback on both nodes.
pub static RADIO_INBOX: InboundQueue<INBOUND_CAPACITY> = InboundQueue::new();
