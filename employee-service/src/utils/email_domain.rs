//! Optional email domain restriction for registration.

/// Check that the address belongs to the allowed domain, when one is
/// configured. No restriction means every domain passes.
pub fn is_allowed_domain(email: &str, allowed_domain: Option<&str>) -> bool {
    let Some(allowed) = allowed_domain else {
        return true;
    };
    match email.rsplit_once('@') {
        Some((_, domain)) => domain.eq_ignore_ascii_case(allowed),
        None => false,
    }
}
