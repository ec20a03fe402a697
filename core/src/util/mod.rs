//! Non-randomized hash containers. FxHash keys iterate in the same order
//! every run, which the solver relies on for reproducible diagnostics.

pub(crate) type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

pub(crate) type FastHashSet<K> = rustc_hash::FxHashSet<K>;
