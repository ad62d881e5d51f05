//! Leaf stores that are invoked like functions.

/// A store that can be called with arguments.
pub trait Callable<Args> {
    type Output;

    fn call(&self, args: Args) -> Self::Output;
}
