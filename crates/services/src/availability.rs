//! Saved-session availability check with latest-wins semantics.
//!
//! The identity provider may report several changes in quick succession while
//! an earlier lookup is still in flight. Each lookup gets a ticket; only the
//! ticket from the most recent `begin` may publish its result.

use quiz_core::model::UserIdentity;

/// Identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityState {
    pub identity: Option<UserIdentity>,
    /// False while the provider is still resolving.
    pub resolved: bool,
}

impl IdentityState {
    #[must_use]
    pub fn loading() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            resolved: true,
        }
    }

    #[must_use]
    pub fn signed_in(identity: UserIdentity) -> Self {
        Self {
            identity: Some(identity),
            resolved: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SavedSessionStatus {
    #[default]
    Loading,
    Available,
    Unavailable,
}

/// Permission to run one lookup and publish its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
    identity: Option<UserIdentity>,
}

impl CheckTicket {
    #[must_use]
    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct SavedSessionCheck {
    generation: u64,
    status: SavedSessionStatus,
    last_identity: Option<Option<UserIdentity>>,
}

impl SavedSessionCheck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// React to an identity change.
    ///
    /// Returns a new ticket when a lookup should run, invalidating any
    /// outstanding one. No lookup runs while the identity is still resolving
    /// or when it matches the identity checked last.
    pub fn begin(&mut self, state: &IdentityState) -> Option<CheckTicket> {
        if !state.resolved {
            self.generation += 1;
            self.last_identity = None;
            self.status = SavedSessionStatus::Loading;
            return None;
        }
        if self.last_identity.as_ref() == Some(&state.identity) {
            return None;
        }

        self.generation += 1;
        self.last_identity = Some(state.identity.clone());
        self.status = SavedSessionStatus::Loading;
        Some(CheckTicket {
            generation: self.generation,
            identity: state.identity.clone(),
        })
    }

    /// Publish a lookup result. Stale tickets are discarded and return false.
    pub fn complete(&mut self, ticket: &CheckTicket, found: bool) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.status = if found {
            SavedSessionStatus::Available
        } else {
            SavedSessionStatus::Unavailable
        };
        true
    }

    /// Mark the current identity's snapshot as gone (e.g. after starting over).
    pub fn invalidate(&mut self) {
        self.status = SavedSessionStatus::Unavailable;
    }

    #[must_use]
    pub fn status(&self) -> SavedSessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == SavedSessionStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_lookup_while_identity_resolves() {
        let mut check = SavedSessionCheck::new();
        assert!(check.begin(&IdentityState::loading()).is_none());
        assert!(check.is_loading());
    }

    #[test]
    fn latest_change_wins() {
        let mut check = SavedSessionCheck::new();
        let first = check.begin(&IdentityState::signed_out()).unwrap();
        let second = check
            .begin(&IdentityState::signed_in(UserIdentity::new("alice")))
            .unwrap();

        assert!(check.complete(&second, false));
        assert!(!check.complete(&first, true));
        assert_eq!(check.status(), SavedSessionStatus::Unavailable);
    }

    #[test]
    fn same_identity_is_checked_once() {
        let mut check = SavedSessionCheck::new();
        let alice = IdentityState::signed_in(UserIdentity::new("alice"));
        let ticket = check.begin(&alice).unwrap();
        assert_eq!(ticket.identity(), Some(&UserIdentity::new("alice")));
        assert!(check.complete(&ticket, true));

        assert!(check.begin(&alice).is_none());
        assert_eq!(check.status(), SavedSessionStatus::Available);
    }

    #[test]
    fn repeated_identity_keeps_in_flight_lookup() {
        let mut check = SavedSessionCheck::new();
        let alice = IdentityState::signed_in(UserIdentity::new("alice"));
        let ticket = check.begin(&alice).unwrap();

        assert!(check.begin(&alice).is_none());
        assert!(check.complete(&ticket, true));
        assert_eq!(check.status(), SavedSessionStatus::Available);
    }

    #[test]
    fn re_resolving_identity_checks_again() {
        let mut check = SavedSessionCheck::new();
        let alice = IdentityState::signed_in(UserIdentity::new("alice"));
        let stale = check.begin(&alice).unwrap();
        assert!(check.begin(&IdentityState::loading()).is_none());

        let fresh = check.begin(&alice).unwrap();
        assert!(!check.complete(&stale, false));
        assert!(check.complete(&fresh, true));
        assert_eq!(check.status(), SavedSessionStatus::Available);
    }
}
