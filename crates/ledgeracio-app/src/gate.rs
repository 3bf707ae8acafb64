use ledgeracio_core::allowlist::CommittedAllowlist;
use ledgeracio_core::nomination::NominationRequest;
use ledgeracio_store::AllowlistStore;
use tracing::{debug, warn};

/// Whether every nomination target is on the committed allowlist.
///
/// Fails closed: no committed allowlist, an unreadable store, or a single
/// unknown target all yield `false`. Read-only with respect to the store.
pub fn check_nomination_allowed(store: &AllowlistStore, request: &NominationRequest) -> bool {
    match store.committed_allowlist() {
        Ok(committed) => targets_allowed(committed.as_ref(), request),
        Err(e) => {
            warn!(error = %e, "allowlist unreadable; refusing nomination");
            false
        }
    }
}

/// Membership test against an optional allowlist.
pub fn targets_allowed(committed: Option<&CommittedAllowlist>, request: &NominationRequest) -> bool {
    let Some(allowlist) = committed else {
        debug!("no allowlist committed");
        return false;
    };
    match request.targets.iter().find(|t| !allowlist.contains(t)) {
        Some(missing) => {
            debug!(address = %missing, "nomination target not allowlisted");
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgeracio_core::types::{Address, ContentHash};
    use proptest::prelude::*;

    fn allowlist(entries: Vec<Address>) -> CommittedAllowlist {
        CommittedAllowlist { nonce: 1, hash: ContentHash([0u8; 32]), entries }
    }

    fn request(targets: Vec<Address>) -> NominationRequest {
        NominationRequest { targets }
    }

    #[test]
    fn membership_is_order_independent() {
        let list = allowlist(vec![Address([1; 32]), Address([2; 32]), Address([3; 32])]);
        let req = request(vec![Address([3; 32]), Address([1; 32])]);
        assert!(targets_allowed(Some(&list), &req));
    }

    #[test]
    fn one_unknown_target_denies() {
        let list = allowlist(vec![Address([1; 32]), Address([2; 32])]);
        let req = request(vec![Address([1; 32]), Address([2; 32]), Address([9; 32])]);
        assert!(!targets_allowed(Some(&list), &req));
    }

    #[test]
    fn empty_store_denies() {
        let store = AllowlistStore::temporary().unwrap();
        assert!(!check_nomination_allowed(&store, &request(vec![Address([1; 32])])));
    }

    #[test]
    fn committed_store_allows_listed_target() {
        let store = AllowlistStore::temporary().unwrap();
        store.commit_allowlist(&allowlist(vec![Address([4; 32])])).unwrap();
        assert!(check_nomination_allowed(&store, &request(vec![Address([4; 32])])));
        assert!(!check_nomination_allowed(&store, &request(vec![Address([5; 32])])));
    }

    fn address() -> impl Strategy<Value = Address> {
        any::<[u8; 32]>().prop_map(Address)
    }

    proptest! {
        #[test]
        fn absent_allowlist_always_denies(targets in prop::collection::vec(address(), 1..16)) {
            prop_assert!(!targets_allowed(None, &request(targets)));
        }

        #[test]
        fn any_missing_target_denies(
            listed in prop::collection::vec(address(), 1..16),
            outsider in address(),
            position in any::<prop::sample::Index>(),
        ) {
            prop_assume!(!listed.contains(&outsider));
            let mut targets = listed.clone();
            let at = position.index(targets.len() + 1);
            targets.insert(at, outsider);
            prop_assert!(!targets_allowed(Some(&allowlist(listed)), &request(targets)));
        }

        #[test]
        fn fully_listed_request_allows(listed in prop::collection::vec(address(), 1..16)) {
            let mut targets = listed.clone();
            targets.reverse();
            prop_assert!(targets_allowed(Some(&allowlist(listed)), &request(targets)));
        }
    }
}
