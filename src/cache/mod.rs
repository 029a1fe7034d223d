//! Sample cache — memoizes rendered buffers by (waveform, command).
//!
//! One cache is shared by every generator in the process (hand each one an
//! `Arc<SampleCache>`). Entries are evicted least-recently-used once the
//! retained PCM exceeds the byte budget; an evicted entry behaves exactly like
//! a miss and is re-rendered on demand.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::script::Command;
use crate::synth::SampleBuffer;
use crate::waveform::{Waveform, PERCUSSION};

/// Default PCM budget: 32 MiB (about 12 minutes of audio).
pub const DEFAULT_CAPACITY: usize = 32 * 1024 * 1024;

/// Outer cache key. `None` is the white-noise bucket.
pub type BucketKey = Option<Waveform>;

type Bucket = HashMap<Command, Entry>;

struct Entry {
    buffer: SampleBuffer,
    last_used: u64,
}

#[derive(Default)]
struct Buckets {
    noise: Bucket,
    tonal: HashMap<Waveform, Bucket>,
    /// Every entry by its last-use tick, oldest first.
    recency: BTreeMap<u64, (BucketKey, Command)>,
    bytes: usize,
    clock: u64,
}

impl Buckets {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn bucket_mut(&mut self, key: Option<&Waveform>) -> Option<&mut Bucket> {
        match key {
            None => Some(&mut self.noise),
            Some(wf) => self.tonal.get_mut(wf),
        }
    }

    /// Look up an entry and mark it as just used.
    fn touch(&mut self, key: Option<&Waveform>, command: &Command) -> Option<SampleBuffer> {
        let now = self.tick();
        let entry = self.bucket_mut(key)?.get_mut(command)?;
        let previous = std::mem::replace(&mut entry.last_used, now);
        let buffer = entry.buffer.clone();
        if let Some(slot) = self.recency.remove(&previous) {
            self.recency.insert(now, slot);
        }
        Some(buffer)
    }

    fn insert(&mut self, key: Option<&Waveform>, command: &Command, buffer: SampleBuffer) {
        let now = self.tick();
        let size = buffer.len();
        let bucket = match key {
            None => &mut self.noise,
            Some(wf) => self.tonal.entry(wf.clone()).or_default(),
        };
        let previous = bucket.insert(
            command.clone(),
            Entry {
                buffer,
                last_used: now,
            },
        );
        if let Some(old) = previous {
            self.bytes -= old.buffer.len();
            self.recency.remove(&old.last_used);
        }
        self.recency.insert(now, (key.cloned(), command.clone()));
        self.bytes += size;
    }

    /// Drop least-recently-used entries until within `capacity`. The most
    /// recent entry is always kept, even when it alone exceeds the budget.
    fn evict(&mut self, capacity: usize) {
        while self.bytes > capacity && self.recency.len() > 1 {
            let Some((_, (key, command))) = self.recency.pop_first() else {
                break;
            };
            if let Some(entry) = self
                .bucket_mut(key.as_ref())
                .and_then(|bucket| bucket.remove(&command))
            {
                self.bytes -= entry.buffer.len();
            }
        }
    }
}

/// Process-wide memo of rendered sample buffers.
///
/// Lookups and inserts lock internally; callers never lock. Synthesis runs
/// outside the lock, so two threads missing on the same key may both render
/// and both insert. The last insert wins, which is harmless because equal keys
/// render equal audio.
pub struct SampleCache {
    inner: Mutex<Buckets>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SampleCache {
    /// Create a cache with the [`DEFAULT_CAPACITY`] byte budget.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache holding at most `capacity` bytes of PCM.
    ///
    /// The white-noise bucket and the percussion buckets exist from the start.
    pub fn with_capacity(capacity: usize) -> Self {
        let cache = Self {
            inner: Mutex::new(Buckets::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        };
        cache.register(None);
        for wf in &PERCUSSION {
            cache.register(Some(wf));
        }
        cache
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make sure a bucket exists for `waveform`.
    pub fn register(&self, waveform: Option<&Waveform>) {
        if let Some(wf) = waveform {
            let mut inner = self.lock();
            if !inner.tonal.contains_key(wf) {
                inner.tonal.insert(wf.clone(), Bucket::new());
            }
        }
    }

    /// Look up a cached buffer without rendering.
    pub fn get(&self, waveform: Option<&Waveform>, command: &Command) -> Option<SampleBuffer> {
        self.lock().touch(waveform, command)
    }

    /// Return the cached buffer for `(waveform, command)`, rendering it with
    /// `synthesize` on a miss.
    pub fn get_or_create<F>(
        &self,
        waveform: Option<&Waveform>,
        command: &Command,
        synthesize: F,
    ) -> SampleBuffer
    where
        F: FnOnce() -> SampleBuffer,
    {
        if let Some(buffer) = self.get(waveform, command) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return buffer;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let buffer = synthesize();
        self.insert(waveform, command, buffer.clone());
        buffer
    }

    fn insert(&self, waveform: Option<&Waveform>, command: &Command, buffer: SampleBuffer) {
        let mut inner = self.lock();
        inner.insert(waveform, command, buffer);
        inner.evict(self.capacity);
    }

    /// Drop every cached buffer. Buckets stay registered.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.noise.clear();
        for bucket in inner.tonal.values_mut() {
            bucket.clear();
        }
        inner.recency.clear();
        inner.bytes = 0;
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.lock().recency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of PCM currently retained.
    pub fn bytes(&self) -> usize {
        self.lock().bytes
    }

    /// The byte budget.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered waveform buckets, including the noise bucket.
    pub fn bucket_count(&self) -> usize {
        self.lock().tonal.len() + 1
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for SampleCache {
    fn default() -> Self {
        Self::new()
    }
}
