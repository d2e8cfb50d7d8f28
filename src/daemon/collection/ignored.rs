use std::{collections::HashSet, sync::Arc};

/// Placeholder reported while the login or lock screen is in front.
pub const LOGIN_WINDOW: &str = "loginwindow";

/// Decides which samples don't count as an observation.
pub struct IgnoredApps {
    names: HashSet<Arc<str>>,
}

impl IgnoredApps {
    pub fn new(names: impl IntoIterator<Item = impl Into<Arc<str>>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, app_name: &str) -> bool {
        app_name.trim().is_empty() || self.names.contains(app_name)
    }

    /// Keeps a sample only if it is a real observation.
    pub fn filter(&self, sample: Option<Arc<str>>) -> Option<Arc<str>> {
        sample.filter(|v| !self.is_ignored(v))
    }
}

impl Default for IgnoredApps {
    fn default() -> Self {
        Self::new([LOGIN_WINDOW])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{IgnoredApps, LOGIN_WINDOW};

    #[test]
    fn test_default_ignores_login_window() {
        let ignored = IgnoredApps::default();
        assert!(ignored.is_ignored(LOGIN_WINDOW));
        assert!(!ignored.is_ignored("Finder"));
    }

    #[test]
    fn test_blank_names_are_ignored() {
        let ignored = IgnoredApps::new(Vec::<String>::new());
        assert!(ignored.is_ignored(""));
        assert!(ignored.is_ignored("   "));
    }

    #[test]
    fn test_filter() {
        let ignored = IgnoredApps::new(["screensaver", "loginwindow"]);
        assert_eq!(ignored.filter(Some("screensaver".into())), None);
        assert_eq!(ignored.filter(None), None);
        assert_eq!(
            ignored.filter(Some("Mail".into())),
            Some(Arc::from("Mail"))
        );
    }
}
