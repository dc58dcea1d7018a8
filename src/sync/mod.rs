//! One-way mirroring of a source tree into a replica tree.
//!
//! The comparator performs a single pass; the driver validates roots and
//! repeats passes on a polling interval.

pub mod comparator;
pub mod driver;
pub mod events;
pub mod hash;

pub use comparator::{PassStats, TreeComparator};
pub use driver::{DriverState, ErrorPolicy, RunSummary, Sleeper, SyncDriver, ThreadSleeper};
pub use events::{EventSink, Severity, SyncEvent, TracingSink};
pub use hash::{hash_bytes, hash_file, DigestAlgorithm, FileDigest, Hasher};
