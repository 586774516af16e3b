/// Base-URL prefixing for asset paths.
///
/// The CMS hands out upload paths such as `/uploads/small_hero.png`. Where
/// they are served from is deployment configuration, so the prefix is given
/// once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetUrls {
    base_url: Option<String>,
}

impl AssetUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url: (!base_url.is_empty()).then_some(base_url),
        }
    }

    /// Leave every path as the CMS returned it.
    pub fn relative() -> Self {
        Self::default()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Prefix `path` with the base URL. Absolute and protocol-relative URLs
    /// pass through unchanged.
    pub fn absolute(&self, path: &str) -> String {
        let is_absolute = path.starts_with("//") || path.contains("://");
        match &self.base_url {
            Some(base) if !is_absolute => format!("{base}/{}", path.trim_start_matches('/')),
            _ => path.to_string(),
        }
    }
}
