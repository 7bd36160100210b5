/// Album access control
///
/// A pure, total function consumed by every read path and by upload
/// authorization. Callers that deny access must answer exactly as if
/// the album did not exist (same error kind, same status) so private
/// albums leak no existence information.
use crate::models::Album;

/// Whether `requester_id` may view `album`
///
/// Public albums are visible to everyone, including anonymous
/// requesters. Private albums require a known requester on the
/// allow-list.
pub fn can_access(album: &Album, requester_id: Option<&str>) -> bool {
    if album.is_public {
        return true;
    }
    match requester_id {
        Some(id) => album.allowed_users.iter().any(|u| u == id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(is_public: bool, allowed: &[&str]) -> Album {
        Album::new(
            "Test".to_string(),
            String::new(),
            "test".to_string(),
            is_public,
            allowed.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_public_album_visible_to_everyone() {
        let a = album(true, &[]);
        assert!(can_access(&a, None));
        assert!(can_access(&a, Some("anyone")));
    }

    #[test]
    fn test_private_album_requires_allow_list() {
        let a = album(false, &["u1", "u2"]);
        assert!(can_access(&a, Some("u1")));
        assert!(can_access(&a, Some("u2")));
        assert!(!can_access(&a, Some("u3")));
    }

    #[test]
    fn test_private_album_denies_anonymous() {
        let a = album(false, &["u1"]);
        assert!(!can_access(&a, None));
    }

    #[test]
    fn test_private_album_with_empty_allow_list_denies_all() {
        let a = album(false, &[]);
        assert!(!can_access(&a, None));
        assert!(!can_access(&a, Some("u1")));
    }
}
