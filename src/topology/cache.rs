//! Cache invalidation shared by meshes that hold derived connectivity.

/// Anything that caches derived connectivity (edge tables, face tables,
/// neighbor maps, locate structures) implements this.
pub trait InvalidateCache {
    /// Drop every derived table so future queries rebuild from the primary
    /// node/element arrays.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}
