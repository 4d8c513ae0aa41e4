//! Closed enums used as FSM states and flags.
//!
//! The transition table is a dense `COUNT(S) × COUNT(F)` array, so both
//! states and flags must map to contiguous indices.  Declare them with
//! [`fsm_enum!`](crate::fsm_enum) rather than implementing [`FsmEnum`] by
//! hand.

use std::fmt::Debug;
use std::hash::Hash;

/// A fieldless enum with a dense `0..COUNT` index.
pub trait FsmEnum: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Number of variants.
    const COUNT: usize;

    fn index(self) -> usize;

    fn from_index(index: usize) -> Option<Self>;

    /// Variant name, for logs.
    fn name(self) -> &'static str;
}

/// Declare a fieldless enum and implement [`FsmEnum`] for it.
///
/// ```rust
/// evo_fsm::fsm_enum! {
///     /// Door states.
///     pub enum Door { Open, Closed }
/// }
///
/// use evo_fsm::FsmEnum;
/// assert_eq!(Door::COUNT, 2);
/// assert_eq!(Door::from_index(1), Some(Door::Closed));
/// assert_eq!(Door::Open.name(), "Open");
/// ```
#[macro_export]
macro_rules! fsm_enum {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vattr:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $($(#[$vattr])* $variant),+
        }

        impl $crate::FsmEnum for $name {
            const COUNT: usize = [$(stringify!($variant)),+].len();

            #[inline]
            fn index(self) -> usize {
                self as usize
            }

            fn from_index(index: usize) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$variant),+];
                ALL.get(index).copied()
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }
    };
}
