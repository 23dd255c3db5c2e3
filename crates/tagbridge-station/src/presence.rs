//! Per-slot presence state machine.
//!
//! Each slot remembers which tag it last saw and whether that tag's payload
//! has been resolved. One poll outcome per cycle drives one step:
//!
//! ```text
//! state           outcome            decode    next              announce
//! Idle            NoTag              -         Idle              -
//! Identified(u)   NoTag              -         Idle              REMOVED
//! Pending(u, n)   NoTag              -         Idle              -
//! Identified(u)   Tag(u)             -         Identified(u)     -
//! Pending(u, n)   Tag(u)             ok        Identified(u)     UID, PAYLOAD
//! Pending(u, n)   Tag(u)             fails     Pending(u, n+1)   -
//!                                              (n+1 = cap: Identified(u), UID + hex UID)
//! any             Tag(v), v new      ok        Identified(v)     UID, PAYLOAD
//! any             Tag(v), v new      fails     Pending(v, 1)     -
//! ```
//!
//! A tag is announced (UID then PAYLOAD) exactly once, on the cycle its
//! payload resolves or decoding is abandoned. `REMOVED` follows only an
//! announced tag. The machine is pure: the caller performs the decode attempt
//! when [`PresenceState::wants_decode`] says so and passes the result to
//! [`PresenceState::advance`].

use std::fmt;
use tagbridge_core::TagUid;

/// What one poll saw on the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    NoTag,
    Tag(TagUid),
}

impl From<Option<TagUid>> for PollOutcome {
    fn from(uid: Option<TagUid>) -> Self {
        uid.map_or(PollOutcome::NoTag, PollOutcome::Tag)
    }
}

/// Presence state of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PresenceState {
    /// No tag on the reader.
    #[default]
    Idle,

    /// Tag announced; its payload was decoded or abandoned.
    Identified { uid: TagUid },

    /// Tag seen but not announced; `retries` failed decode attempts so far.
    PendingPayload { uid: TagUid, retries: u32 },
}

/// Where an announced payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Decoded from tag memory.
    Decoded,
    /// Decoding was abandoned; the payload is the hex UID.
    RawUid,
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed (empty slot, or the same announced tag).
    Unchanged,

    /// Tag resolved: announce `uid` with `payload`.
    Resolved {
        uid: TagUid,
        payload: String,
        source: PayloadSource,
    },

    /// Decode failed; the tag stays unannounced.
    Pending { uid: TagUid, retries: u32 },

    /// An announced tag left the slot.
    Removed { uid: TagUid },

    /// An unannounced tag left the slot.
    Dropped { uid: TagUid },
}

impl PresenceState {
    /// UID currently associated with the slot.
    pub fn uid(&self) -> Option<&TagUid> {
        match self {
            PresenceState::Idle => None,
            PresenceState::Identified { uid } | PresenceState::PendingPayload { uid, .. } => {
                Some(uid)
            }
        }
    }

    /// Failed decode attempts for the pending tag.
    pub fn retries(&self) -> u32 {
        match self {
            PresenceState::PendingPayload { retries, .. } => *retries,
            _ => 0,
        }
    }

    /// Whether `outcome` calls for a decode attempt before [`advance`].
    ///
    /// True for a new tag and for a retry of the pending one; false for an
    /// empty slot and for the tag already announced.
    ///
    /// [`advance`]: PresenceState::advance
    pub fn wants_decode(&self, outcome: &PollOutcome) -> bool {
        match (self, outcome) {
            (_, PollOutcome::NoTag) => false,
            (PresenceState::Identified { uid }, PollOutcome::Tag(seen)) => uid != seen,
            (_, PollOutcome::Tag(_)) => true,
        }
    }

    /// Apply one poll outcome.
    ///
    /// `decoded` is the result of the decode attempt made because
    /// [`wants_decode`](PresenceState::wants_decode) returned true, and is
    /// ignored otherwise. `max_retries` is the number of failed attempts after
    /// which the raw UID is announced.
    pub fn advance(
        &mut self,
        outcome: PollOutcome,
        decoded: Option<String>,
        max_retries: u32,
    ) -> Transition {
        let current = std::mem::take(self);

        let (next, transition) = match (current, outcome) {
            (PresenceState::Idle, PollOutcome::NoTag) => (PresenceState::Idle, Transition::Unchanged),
            (PresenceState::Identified { uid }, PollOutcome::NoTag) => {
                (PresenceState::Idle, Transition::Removed { uid })
            }
            (PresenceState::PendingPayload { uid, .. }, PollOutcome::NoTag) => {
                (PresenceState::Idle, Transition::Dropped { uid })
            }
            (PresenceState::Identified { uid }, PollOutcome::Tag(seen)) if uid == seen => {
                (PresenceState::Identified { uid }, Transition::Unchanged)
            }
            (PresenceState::PendingPayload { uid, retries }, PollOutcome::Tag(seen))
                if uid == seen =>
            {
                attempt(uid, retries, decoded, max_retries)
            }
            (_, PollOutcome::Tag(seen)) => attempt(seen, 0, decoded, max_retries),
        };

        *self = next;
        transition
    }
}

/// One decode attempt for `uid` after `retries` earlier failures.
fn attempt(
    uid: TagUid,
    retries: u32,
    decoded: Option<String>,
    max_retries: u32,
) -> (PresenceState, Transition) {
    if let Some(payload) = decoded {
        return resolved(uid, payload, PayloadSource::Decoded);
    }

    let retries = retries.saturating_add(1);
    if retries >= max_retries {
        let payload = uid.to_hex();
        return resolved(uid, payload, PayloadSource::RawUid);
    }

    (
        PresenceState::PendingPayload {
            uid: uid.clone(),
            retries,
        },
        Transition::Pending { uid, retries },
    )
}

fn resolved(uid: TagUid, payload: String, source: PayloadSource) -> (PresenceState, Transition) {
    (
        PresenceState::Identified { uid: uid.clone() },
        Transition::Resolved {
            uid,
            payload,
            source,
        },
    )
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PresenceState::Idle => write!(f, "Idle"),
            PresenceState::Identified { uid } => write!(f, "Identified({uid})"),
            PresenceState::PendingPayload { uid, retries } => {
                write!(f, "PendingPayload({uid}, retries={retries})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const CAP: u32 = 10;

    fn uid(hex: &str) -> TagUid {
        TagUid::from_hex(hex).unwrap()
    }

    fn cat() -> TagUid {
        uid("04A3B2C1D2E3F4")
    }

    fn step(state: &mut PresenceState, outcome: PollOutcome, decoded: Option<&str>) -> Transition {
        let decoded = if state.wants_decode(&outcome) {
            decoded.map(str::to_string)
        } else {
            None
        };
        state.advance(outcome, decoded, CAP)
    }

    #[test]
    fn test_new_tag_decoded_immediately() {
        let mut state = PresenceState::Idle;
        let t = step(&mut state, PollOutcome::Tag(cat()), Some("Cat"));

        assert_eq!(
            t,
            Transition::Resolved {
                uid: cat(),
                payload: "Cat".to_string(),
                source: PayloadSource::Decoded
            }
        );
        assert_eq!(state, PresenceState::Identified { uid: cat() });
    }

    #[test]
    fn test_pending_until_decoded() {
        let mut state = PresenceState::Idle;

        let t1 = step(&mut state, PollOutcome::Tag(cat()), None);
        assert_eq!(t1, Transition::Pending { uid: cat(), retries: 1 });
        let t2 = step(&mut state, PollOutcome::Tag(cat()), None);
        assert_eq!(t2, Transition::Pending { uid: cat(), retries: 2 });
        let t3 = step(&mut state, PollOutcome::Tag(cat()), Some("Cat"));
        assert!(matches!(t3, Transition::Resolved { ref payload, .. } if payload == "Cat"));
        assert_eq!(state.retries(), 0);
    }

    #[test]
    fn test_abandon_at_cap_with_raw_uid() {
        let mut state = PresenceState::Idle;
        for expected in 1..CAP {
            let t = step(&mut state, PollOutcome::Tag(cat()), None);
            assert_eq!(t, Transition::Pending { uid: cat(), retries: expected });
        }

        let t = step(&mut state, PollOutcome::Tag(cat()), None);
        assert_eq!(
            t,
            Transition::Resolved {
                uid: cat(),
                payload: "04A3B2C1D2E3F4".to_string(),
                source: PayloadSource::RawUid
            }
        );
        assert_eq!(state, PresenceState::Identified { uid: cat() });
    }

    #[test]
    fn test_cap_of_one_abandons_on_first_failure() {
        let mut state = PresenceState::Idle;
        let t = state.advance(PollOutcome::Tag(cat()), None, 1);
        assert!(matches!(t, Transition::Resolved { source: PayloadSource::RawUid, .. }));
    }

    #[rstest]
    #[case::identified(PresenceState::Identified { uid: cat() }, Transition::Removed { uid: cat() })]
    #[case::pending(PresenceState::PendingPayload { uid: cat(), retries: 3 }, Transition::Dropped { uid: cat() })]
    #[case::idle(PresenceState::Idle, Transition::Unchanged)]
    fn test_no_tag(#[case] state: PresenceState, #[case] expected: Transition) {
        let mut state = state;
        assert!(!state.wants_decode(&PollOutcome::NoTag));
        assert_eq!(state.advance(PollOutcome::NoTag, None, CAP), expected);
        assert_eq!(state, PresenceState::Idle);
    }

    #[test]
    fn test_same_tag_is_debounced() {
        let mut state = PresenceState::Identified { uid: cat() };
        assert!(!state.wants_decode(&PollOutcome::Tag(cat())));
        // A stray decode result is ignored for an announced tag
        let t = state.advance(PollOutcome::Tag(cat()), Some("Dog".to_string()), CAP);
        assert_eq!(t, Transition::Unchanged);
        assert_eq!(state, PresenceState::Identified { uid: cat() });
    }

    #[test]
    fn test_swap_while_pending_restarts_retries() {
        let other = uid("04112233");
        let mut state = PresenceState::PendingPayload { uid: cat(), retries: 7 };
        assert!(state.wants_decode(&PollOutcome::Tag(other.clone())));

        let t = step(&mut state, PollOutcome::Tag(other.clone()), None);
        assert_eq!(t, Transition::Pending { uid: other, retries: 1 });
    }

    #[test]
    fn test_swap_while_identified_announces_new_tag() {
        let other = uid("04112233");
        let mut state = PresenceState::Identified { uid: cat() };

        let t = step(&mut state, PollOutcome::Tag(other.clone()), Some("Fish"));
        assert!(matches!(t, Transition::Resolved { uid, .. } if uid == other));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(PollOutcome::from(None), PollOutcome::NoTag);
        assert_eq!(PollOutcome::from(Some(cat())), PollOutcome::Tag(cat()));
    }

    /// One simulated cycle: which tag (if any) is on the reader, and whether
    /// its memory decodes this time.
    fn cycle() -> impl Strategy<Value = (Option<u8>, bool)> {
        (prop::option::of(0u8..3), any::<bool>())
    }

    fn tag_uid(n: u8) -> TagUid {
        TagUid::new(vec![0x04, 0x00, 0x00, n]).unwrap()
    }

    proptest! {
        /// REMOVED only ever follows an announcement, a tag is never
        /// announced twice in a row while it stays on the reader, and the
        /// retry counter never passes the cap.
        #[test]
        fn prop_announcement_invariants(
            cycles in prop::collection::vec(cycle(), 0..200),
            cap in 1u32..12,
        ) {
            let mut state = PresenceState::Idle;
            let mut announced: Option<TagUid> = None;

            for (tag, decodes) in cycles {
                let outcome = PollOutcome::from(tag.map(tag_uid));
                let decoded = (state.wants_decode(&outcome) && decodes).then(|| "x".to_string());
                let t = state.advance(outcome, decoded, cap);

                match &t {
                    Transition::Removed { uid } => {
                        let taken = announced.take();
                        prop_assert_eq!(taken.as_ref(), Some(uid));
                    }
                    Transition::Resolved { uid, .. } => {
                        prop_assert_ne!(announced.as_ref(), Some(uid));
                        announced = Some(uid.clone());
                    }
                    Transition::Pending { .. } | Transition::Dropped { .. } => {
                        // An announced tag swapped out without an empty poll is forgotten
                        announced = None;
                    }
                    Transition::Unchanged => {}
                }

                prop_assert!(state.retries() < cap);
                if let PresenceState::Identified { uid } = &state {
                    prop_assert_eq!(announced.as_ref(), Some(uid));
                }
            }
        }
    }
}
