use std::sync::atomic::{AtomicU32, Ordering};

/// An `f32` that can be added to from many threads at once.
///
/// The value is stored as its bit pattern in an `AtomicU32`. [fetch_add](AtomicF32::fetch_add) retries a
/// compare-exchange until no other thread changed the value in between, so concurrent additions are never lost.
/// Each single addition is exact in `f32` arithmetic, but the final sum of many concurrent additions depends on
/// the order in which they happened to be applied.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    /// Creates a new `AtomicF32` holding `value`
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Loads the current value
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.bits.load(order))
    }

    /// Stores `value`
    pub fn store(&self, value: f32, order: Ordering) {
        self.bits.store(value.to_bits(), order);
    }

    /// Adds `value` to the current value and returns the previous value
    ///
    /// ```
    /// # use voxelize_core::containers::AtomicF32;
    /// # use std::sync::atomic::Ordering;
    /// let sum = AtomicF32::new(1.5);
    /// assert_eq!(1.5, sum.fetch_add(2.0, Ordering::Relaxed));
    /// assert_eq!(3.5, sum.load(Ordering::Relaxed));
    /// ```
    pub fn fetch_add(&self, value: f32, order: Ordering) -> f32 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let new = (f32::from_bits(current) + value).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, new, order, Ordering::Relaxed)
            {
                Ok(previous) => return f32::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Consumes the atomic and returns the contained value
    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.bits.into_inner())
    }
}

impl From<f32> for AtomicF32 {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}
