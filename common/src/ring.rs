#[derive(Clone, Debug, Default)]
struct StoredItem<T: Clone + Default> {
    tick: Option<u64>, // None until the slot is first written.
    data: T,
}

/// Fixed-capacity history indexed by tick.
///
/// Tick `t` lives in slot `t % capacity`. Writing never grows the buffer; it
/// overwrites whatever the slot held, so once a tick is `capacity` ticks old
/// its value is gone.
#[derive(Clone, Debug)]
pub struct RingHistory<T: Clone + Default> {
    slots: Vec<StoredItem<T>>,
}

impl<T> RingHistory<T>
where
    T: Clone + Default,
{
    pub fn new(capacity: usize) -> Self {
        assert!(capacity != 0, "capacity must not be zero");

        Self {
            slots: vec![StoredItem::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub fn index(&self, tick: u64) -> usize {
        (tick % self.slots.len() as u64) as usize
    }

    #[inline(always)]
    pub fn write(&mut self, tick: u64, data: T) {
        let index = self.index(tick);
        self.slots[index] = StoredItem {
            tick: Some(tick),
            data,
        };
    }

    /// Whatever currently occupies the slot for `tick`, possibly data from an
    /// older or newer tick that aliases to the same slot, or `T::default()`.
    #[inline(always)]
    pub fn read(&self, tick: u64) -> &T {
        &self.slots[self.index(tick)].data
    }

    /// The value for `tick` only if that exact tick was the last one written
    /// to its slot.
    pub fn get(&self, tick: u64) -> Option<&T> {
        let item = &self.slots[self.index(tick)];
        match item.tick {
            Some(stored) if stored == tick => Some(&item.data),
            _ => None,
        }
    }

    /// The tick last written to the slot that `tick` maps to.
    #[inline(always)]
    pub fn stamp(&self, tick: u64) -> Option<u64> {
        self.slots[self.index(tick)].tick
    }

    pub fn is_current(&self, tick: u64) -> bool {
        self.stamp(tick) == Some(tick)
    }
}
