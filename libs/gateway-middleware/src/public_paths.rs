use std::sync::Arc;

/// Static classifier for endpoints exempt from the authentication chain.
///
/// Evaluated once per request before any store access, so public traffic
/// never costs a Redis round trip. Matching is plain prefix matching; keep
/// prefixes specific (`/auth/login`, not `/auth/`) so protected siblings
/// like `/auth/logout` stay behind the chain.
#[derive(Debug, Clone)]
pub struct PublicPaths {
    prefixes: Arc<Vec<String>>,
}

impl PublicPaths {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self {
            prefixes: Arc::new(prefixes),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(vec![
            "/auth/login".to_string(),
            "/auth/register".to_string(),
            "/health".to_string(),
            "/metrics".to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exempts_health_and_login() {
        let paths = PublicPaths::default();
        assert!(paths.matches("/health"));
        assert!(paths.matches("/auth/login"));
        assert!(paths.matches("/auth/register"));
        assert!(paths.matches("/metrics"));
    }

    #[test]
    fn test_logout_is_not_public() {
        let paths = PublicPaths::default();
        assert!(!paths.matches("/auth/logout"));
    }

    #[test]
    fn test_protected_paths_do_not_match() {
        let paths = PublicPaths::default();
        assert!(!paths.matches("/api/users/me"));
        assert!(!paths.matches("/sessions/me"));
    }

    #[test]
    fn test_custom_prefixes() {
        let paths = PublicPaths::new(vec!["/public".to_string()]);
        assert!(paths.matches("/public/docs"));
        assert!(!paths.matches("/health"));
    }
}
