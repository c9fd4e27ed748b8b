//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Sessions and spawned units carry strongly-typed IDs so the two can never
//! be mixed up. IDs are UUID v7, so log lines sort by creation time.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a transparent UUID newtype.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id! {
    /// One run session (one orchestrator context).
    SessionId
}

uuid_id! {
    /// A hostile unit created by the encounter scheduler.
    UnitId
}
