//! Normalizing values SendGrid reports differently from what was configured.
//!
//! Each function takes the configured (`desired`) value and what the API
//! returned (`observed`) and decides what goes into state, so that a read
//! right after a write does not show a spurious diff.

use std::collections::BTreeSet;

/// Scopes SendGrid grants on its own, which users never configure.
pub const AUTOMATIC_SCOPES: &[&str] = &[
    "2fa_exempt",
    "2fa_required",
    "sender_verification_eligible",
    "sender_verification_exempt",
];

/// Drop automatic scopes the user did not ask for.
///
/// The result is sorted and free of duplicates, since scopes are a set.
pub fn reconcile_scopes(desired: &[String], observed: &[String]) -> Vec<String> {
    let wanted: BTreeSet<&str> = desired.iter().map(String::as_str).collect();

    observed
        .iter()
        .filter(|scope| {
            !AUTOMATIC_SCOPES.contains(&scope.as_str()) || wanted.contains(scope.as_str())
        })
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keep the configured IPs while SendGrid still reports none.
///
/// Right after a domain is authenticated the IP list comes back empty.
pub fn reconcile_ips(desired: &[String], observed: &[String]) -> Vec<String> {
    if observed.is_empty() && !desired.is_empty() {
        desired.to_vec()
    } else {
        observed.to_vec()
    }
}

/// Admins are reported with every scope; keep what was configured for them.
pub fn reconcile_admin_scopes(is_admin: bool, desired: &[String], observed: &[String]) -> Vec<String> {
    if is_admin {
        desired.to_vec()
    } else {
        reconcile_scopes(desired, observed)
    }
}

/// Keep configured subuser access while the read API does not echo it yet.
pub fn reconcile_subuser_access<T: Clone>(desired: &[T], observed: &[T]) -> Vec<T> {
    if observed.is_empty() {
        desired.to_vec()
    } else {
        observed.to_vec()
    }
}

/// Write-only values are never returned, so state keeps the configured one.
pub fn reconcile_write_only<T>(desired: Option<T>, observed: Option<T>) -> Option<T> {
    desired.or(observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_automatic_scopes_are_dropped() {
        let desired = strings(&["mail.send"]);
        let observed = strings(&["mail.send", "2fa_required", "sender_verification_eligible"]);

        assert_eq!(reconcile_scopes(&desired, &observed), strings(&["mail.send"]));
    }

    #[test]
    fn test_requested_automatic_scope_is_kept() {
        let desired = strings(&["2fa_exempt", "mail.send"]);
        let observed = strings(&["mail.send", "2fa_exempt", "2fa_required"]);

        assert_eq!(
            reconcile_scopes(&desired, &observed),
            strings(&["2fa_exempt", "mail.send"])
        );
    }

    #[test]
    fn test_scopes_are_sorted_and_deduplicated() {
        let observed = strings(&["templates.read", "alerts.read", "templates.read"]);

        assert_eq!(
            reconcile_scopes(&[], &observed),
            strings(&["alerts.read", "templates.read"])
        );
    }

    #[test]
    fn test_unrequested_custom_scope_still_shows_as_drift() {
        let desired = strings(&["mail.send"]);
        let observed = strings(&["mail.send", "user.profile.read"]);

        assert_eq!(
            reconcile_scopes(&desired, &observed),
            strings(&["mail.send", "user.profile.read"])
        );
    }

    #[test]
    fn test_ips_kept_while_observed_empty() {
        let desired = strings(&["192.0.2.10"]);

        assert_eq!(reconcile_ips(&desired, &[]), desired);
        assert_eq!(
            reconcile_ips(&desired, &strings(&["192.0.2.11"])),
            strings(&["192.0.2.11"])
        );
        assert!(reconcile_ips(&[], &[]).is_empty());
    }

    #[test]
    fn test_admin_scopes() {
        let desired = strings(&["mail.send"]);
        let observed = strings(&["mail.send", "templates.read", "2fa_required"]);

        assert_eq!(reconcile_admin_scopes(true, &desired, &observed), desired);
        assert_eq!(
            reconcile_admin_scopes(false, &desired, &observed),
            strings(&["mail.send", "templates.read"])
        );
    }

    #[test]
    fn test_subuser_access() {
        let desired = vec![1, 2];

        assert_eq!(reconcile_subuser_access(&desired, &[]), desired);
        assert_eq!(reconcile_subuser_access(&desired, &[3]), vec![3]);
    }

    #[test]
    fn test_write_only() {
        assert_eq!(
            reconcile_write_only(Some("secret"), None),
            Some("secret")
        );
        assert_eq!(reconcile_write_only(Some("secret"), Some("other")), Some("secret"));
        assert_eq!(reconcile_write_only::<&str>(None, None), None);
    }
}
