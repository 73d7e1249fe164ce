//! Syntax checks for whitelisted addresses and domains.
//!
//! Only plain `local@domain.tld` addresses are accepted; this is not RFC 5322.

use crate::policy::types::{ConditionEntry, ConditionKind};

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

fn has_forbidden_char(s: &str) -> bool {
    s.chars().any(|c| matches!(c, ' ' | '<' | '>'))
}

/// Check a bare domain such as `mail.example.com`.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || has_forbidden_char(domain) || !domain.contains('.') {
        return false;
    }
    if !domain.chars().all(is_domain_char) {
        return false;
    }
    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) {
        return false;
    }
    domain
        .split('.')
        .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
}

/// Check a plain email address such as `jane.doe+dlp@example.com`.
pub fn is_valid_email(email: &str) -> bool {
    if has_forbidden_char(email) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && local.chars().all(is_local_char) && is_valid_domain(domain)
}

/// Validate an entry against the syntax its kind implies.
///
/// Email-kind entries without an `@` are checked as domains.
pub fn is_valid_entry(entry: &ConditionEntry) -> bool {
    match entry.kind {
        ConditionKind::SenderDomain | ConditionKind::RecipientDomain => is_valid_domain(&entry.value),
        ConditionKind::SenderEmail | ConditionKind::RecipientEmail => {
            if entry.value.contains('@') {
                is_valid_email(&entry.value)
            } else {
                is_valid_domain(&entry.value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(is_valid_email("a_b%c-d@x-y.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("Alice <alice@example.com>"));
        assert!(!is_valid_email("a!b@example.com"));
        assert!(!is_valid_email("alice@localhost"));
    }

    #[test]
    fn accepts_plain_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("mail-1.example.io"));
    }

    #[test]
    fn rejects_malformed_domains() {
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain(".example.com"));
        assert!(!is_valid_domain("example.com-"));
        assert!(!is_valid_domain("a..b.com"));
        assert!(!is_valid_domain("-a.b.com"));
        assert!(!is_valid_domain("a.-b.com"));
        assert!(!is_valid_domain("exa mple.com"));
        assert!(!is_valid_domain("exa_mple.com"));
    }

    #[test]
    fn email_entries_without_at_are_checked_as_domains() {
        let entry = ConditionEntry::new(ConditionKind::SenderEmail, "partner.com").unwrap();
        assert!(is_valid_entry(&entry));
        let entry = ConditionEntry::new(ConditionKind::RecipientEmail, "not an address").unwrap();
        assert!(!is_valid_entry(&entry));
    }
}
