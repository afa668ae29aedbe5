//! Generic field-of-view computation.
//!
//! The algorithm only sees plain integer coordinates through a pair of
//! closures, one telling whether a cell stops light and one receiving the
//! cells that were lit. Grid storage, bounds and map data stay with the
//! caller.

mod shadowcast;
pub use shadowcast::{cast, Octant, OCTANTS};
