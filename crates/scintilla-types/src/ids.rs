//! Type-safe integer identifier wrappers.
//!
//! Events, tracks, and lineages are all numbered with plain integers by
//! whoever creates them. Wrapping each in its own newtype prevents passing a
//! track number where an event number is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around an unsigned integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Wrap a raw identifier value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the inner integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of one simulated primary event, unique within a run.
    EventId(u64)
}

define_id! {
    /// Track number assigned by the transport engine, unique within an event.
    TrackId(u32)
}

define_id! {
    /// Identifier the lineage tracker assigns to each lineage it opens.
    ///
    /// Allocated in increasing order, so sorting by id sorts by creation.
    LineageId(u64)
}
