//! Mapping from tile indices to source keys.
//!
//! A [`TileSource`] turns a [`TileIndex`] into the key the fetcher
//! understands, typically a URL. It must be a pure function of the index:
//! the same index always yields the same key.

use crate::coord::TileIndex;

/// Resolves tile indices to source keys.
///
/// Closures of the form `Fn(&TileIndex) -> String` implement this trait, so
/// simple sources need no dedicated type:
///
/// ```
/// use tessera::coord::TileIndex;
/// use tessera::tile::TileSource;
///
/// let source = |index: &TileIndex| format!("/data/tiles/{}/{}/{}.png", index.level, index.x, index.y);
/// assert_eq!(source.source_key(&TileIndex::new(0, 0, 0)), "/data/tiles/0/0/0.png");
/// ```
pub trait TileSource: Send + Sync {
    /// Source key for the given tile.
    fn source_key(&self, index: &TileIndex) -> String;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> TileSource for F
where
    F: Fn(&TileIndex) -> String + Send + Sync,
{
    fn source_key(&self, index: &TileIndex) -> String {
        self(index)
    }
}

/// URL template source.
///
/// Expands `{z}`, `{x}` and `{y}` with the tile's level, column and row.
/// `{s}` is replaced by one of the configured subdomains, picked by
/// `(x + y) mod n` so the mapping stays deterministic per tile.
///
/// # Example
///
/// ```
/// use tessera::coord::TileIndex;
/// use tessera::tile::{TileSource, UrlTemplateSource};
///
/// let source = UrlTemplateSource::new("https://{s}.tile.example.org/{z}/{x}/{y}.png")
///     .with_subdomains(["a", "b", "c"]);
/// assert_eq!(
///     source.source_key(&TileIndex::new(1, 1, 2)),
///     "https://c.tile.example.org/2/1/1.png"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
    subdomains: Vec<String>,
}

impl UrlTemplateSource {
    /// Create a source from a URL template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: Vec::new(),
        }
    }

    /// Set the subdomains substituted for `{s}`.
    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// The raw template.
    pub fn template(&self) -> &str {
        &self.template
    }

    fn subdomain(&self, index: &TileIndex) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let n = self.subdomains.len() as i64;
        let slot = (index.x as i64 + index.y as i64).rem_euclid(n) as usize;
        &self.subdomains[slot]
    }
}

impl TileSource for UrlTemplateSource {
    fn source_key(&self, index: &TileIndex) -> String {
        self.template
            .replace("{z}", &index.level.to_string())
            .replace("{x}", &index.x.to_string())
            .replace("{y}", &index.y.to_string())
            .replace("{s}", self.subdomain(index))
    }

    fn name(&self) -> &str {
        "url-template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_expansion() {
        let source = UrlTemplateSource::new("http://example.com/{z}/{y}/{x}.png");
        assert_eq!(
            source.source_key(&TileIndex::new(3, 5, 4)),
            "http://example.com/4/5/3.png"
        );
    }

    #[test]
    fn test_template_without_subdomains_drops_placeholder() {
        let source = UrlTemplateSource::new("http://{s}example.com/{z}");
        assert_eq!(
            source.source_key(&TileIndex::new(0, 0, 1)),
            "http://example.com/1"
        );
    }

    #[test]
    fn test_subdomain_rotation_is_deterministic() {
        let source = UrlTemplateSource::new("{s}/{z}/{x}/{y}").with_subdomains(["a", "b"]);
        let index = TileIndex::new(3, 4, 5);
        assert_eq!(source.source_key(&index), source.source_key(&index));
        assert_eq!(source.source_key(&TileIndex::new(0, 0, 1)), "a/1/0/0");
        assert_eq!(source.source_key(&TileIndex::new(1, 0, 1)), "b/1/1/0");
    }

    #[test]
    fn test_closure_source() {
        let source = |index: &TileIndex| index.key();
        assert_eq!(source.source_key(&TileIndex::new(1, 2, 3)), "3-1-2");
        assert_eq!(source.name(), "custom");
    }
}
