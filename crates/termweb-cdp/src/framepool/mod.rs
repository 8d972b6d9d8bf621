//! Triple-buffered screencast frame pool.
//!
//! Decoded screencast frames move from a transport's reader task to the
//! renderer through this pool without a per-frame allocation. Three slots
//! decouple one writer from one reader while tolerating a brief second
//! reader overlap (a resize-triggered frame being re-examined):
//!
//! - the *latest* slot is what `acquire_latest_frame` hands out,
//! - one slot is the writer's scratch target,
//! - one slot absorbs a reader that is still holding the previous frame.
//!
//! The writer never overwrites a slot a reader holds; when every candidate
//! slot is held the frame is dropped and counted. Dropping is correct
//! behaviour here, not an error: the renderer only ever wants the newest
//! frame, and Chromium's ack-based flow control adapts the frame rate to
//! the drops.
//!
//! Generations are pool-wide and monotonic. Every write consumes one,
//! dropped or not, so after N writes the counter reads exactly N and the
//! renderer can detect skips by comparing consecutive acquisitions.

use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicU32, AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

/// Number of slots in the pool.
pub const SLOT_COUNT: usize = 3;

/// Initial capacity reserved per slot. Slots grow if a frame exceeds this,
/// but a JPEG screencast frame at terminal resolutions stays well under it.
pub const SLOT_CAPACITY: usize = 512 * 1024;

/// Writer-supplied metadata stored alongside a frame payload.
#[derive(Debug, Clone, Default)]
pub struct FrameMeta {
    /// The integer session id from the `Page.screencastFrame` event, echoed
    /// back in `Page.screencastFrameAck`.
    pub frame_session_id: i64,
    /// The CDP routing session the frame arrived on, if any.
    pub routing_session_id: Option<Arc<str>>,
    /// Device width reported in the frame metadata.
    pub width: u32,
    /// Device height reported in the frame metadata.
    pub height: u32,
}

#[derive(Debug)]
struct SlotBuf {
    data: Vec<u8>,
    meta: FrameMeta,
}

#[derive(Debug)]
struct FrameSlot {
    buf: RwLock<SlotBuf>,
    refcount: AtomicU32,
    generation: AtomicU64,
}

impl FrameSlot {
    fn new() -> Self {
        Self {
            buf: RwLock::new(SlotBuf {
                data: Vec::with_capacity(SLOT_CAPACITY),
                meta: FrameMeta::default(),
            }),
            refcount: AtomicU32::new(0),
            generation: AtomicU64::new(0),
        }
    }
}

/// Outcome of a [`FrameWriter::write_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The frame was stored and is now the latest, under this generation.
    Written(u64),
    /// Every writable slot was held by a reader; the frame was discarded.
    Dropped,
}

/// The shared frame arena. Readers acquire through the pool; the single
/// writer goes through the [`FrameWriter`] handle returned by [`FramePool::new`].
#[derive(Debug)]
pub struct FramePool {
    slots: [FrameSlot; SLOT_COUNT],
    /// Index of the latest written slot, -1 before the first write.
    latest: AtomicIsize,
    /// Pool-wide write counter; generations are never reused.
    generation: AtomicU64,
    dropped: AtomicU64,
}

impl FramePool {
    /// Create a pool and its unique writer handle.
    pub fn new() -> (Arc<Self>, FrameWriter) {
        let pool = Arc::new(Self {
            slots: [FrameSlot::new(), FrameSlot::new(), FrameSlot::new()],
            latest: AtomicIsize::new(-1),
            generation: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });
        let writer = FrameWriter { pool: pool.clone() };
        (pool, writer)
    }

    /// Acquire a reference to the latest written frame, or `None` when no
    /// frame has been written yet.
    ///
    /// Never blocks the writer path and never suspends: the slot's refcount
    /// is raised before validation, and if the slot turns out to have been
    /// overwritten mid-acquire the attempt retries against the new latest.
    pub fn acquire_latest_frame(&self) -> Option<FrameRef<'_>> {
        loop {
            let index = self.latest.load(Ordering::Acquire);
            if index < 0 {
                return None;
            }
            let slot = &self.slots[index as usize];
            let generation = slot.generation.load(Ordering::Acquire);
            slot.refcount.fetch_add(1, Ordering::AcqRel);

            // A held read guard pins the payload; try_read only fails while
            // the writer is mid-overwrite, which also means this slot is no
            // longer the one to return.
            if let Some(guard) = slot.buf.try_read() {
                if generation != 0 && slot.generation.load(Ordering::Acquire) == generation {
                    return Some(FrameRef {
                        slot,
                        guard,
                        generation,
                    });
                }
                drop(guard);
            }
            slot.refcount.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Generation of the latest written frame, if any.
    pub fn latest_generation(&self) -> Option<u64> {
        let index = self.latest.load(Ordering::Acquire);
        if index < 0 {
            return None;
        }
        match self.slots[index as usize].generation.load(Ordering::Acquire) {
            0 => None,
            generation => Some(generation),
        }
    }

    /// Total number of `write_frame` calls so far (dropped writes included).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Number of frames discarded because no slot was writable.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The pool's single writer handle. Constructed once per pool; `&mut self`
/// on [`write_frame`](Self::write_frame) keeps the single-writer invariant
/// in the type system.
#[derive(Debug)]
pub struct FrameWriter {
    pool: Arc<FramePool>,
}

impl FrameWriter {
    /// Store a frame, making it the new latest.
    ///
    /// Selects a slot that is not the current latest and has no readers;
    /// if both candidates are held the frame is dropped. Either way one
    /// generation is consumed.
    pub fn write_frame(&mut self, payload: &[u8], meta: FrameMeta) -> WriteOutcome {
        let pool = &*self.pool;
        let generation = pool.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let latest = pool.latest.load(Ordering::Acquire);

        for index in 0..SLOT_COUNT {
            if index as isize == latest {
                continue;
            }
            let slot = &pool.slots[index];
            if slot.refcount.load(Ordering::Acquire) != 0 {
                continue;
            }
            let Some(mut guard) = slot.buf.try_write() else {
                continue;
            };
            // A reader may have raised the refcount between the check and
            // the lock; it will fail its own validation, but its payload
            // view must stay intact.
            if slot.refcount.load(Ordering::Acquire) != 0 {
                continue;
            }

            guard.data.clear();
            guard.data.extend_from_slice(payload);
            guard.meta = meta;
            slot.generation.store(generation, Ordering::Release);
            pool.latest.store(index as isize, Ordering::Release);
            return WriteOutcome::Written(generation);
        }

        pool.dropped.fetch_add(1, Ordering::Relaxed);
        WriteOutcome::Dropped
    }

    /// The pool this writer feeds.
    pub fn pool(&self) -> &Arc<FramePool> {
        &self.pool
    }
}

/// A zero-copy reference to an acquired frame. Releases its slot when
/// dropped; the writer will not overwrite the slot while any reference is
/// alive.
#[derive(Debug)]
pub struct FrameRef<'a> {
    slot: &'a FrameSlot,
    guard: RwLockReadGuard<'a, SlotBuf>,
    generation: u64,
}

impl FrameRef<'_> {
    /// The frame payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.guard.data
    }

    /// The pool generation this frame was written under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Writer-supplied frame metadata.
    pub fn meta(&self) -> &FrameMeta {
        &self.guard.meta
    }
}

impl Drop for FrameRef<'_> {
    fn drop(&mut self) {
        self.slot.refcount.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests;
