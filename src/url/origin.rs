use crate::url::normalize::{normalize_parsed, normalize_url};
use crate::{UrlError, UrlResult};
use url::Url;

/// Fixed origin of the target site
///
/// Every URL the crawler stores or compares is resolved against this origin
/// and normalized first. Hosts are compared without a leading `www.`, so
/// `www.site.ru` and `site.ru` are the same site; resolved URLs always carry
/// the root's spelling of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin {
    root: Url,
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl SiteOrigin {
    /// Builds the origin from the configured base URL
    ///
    /// # Examples
    ///
    /// ```
    /// use zhk_scout::url::SiteOrigin;
    ///
    /// let origin = SiteOrigin::new("https://www.novostroyki.example/").unwrap();
    /// let city = origin.resolve("/krasnodar/", origin.root()).unwrap();
    /// assert_eq!(city.as_str(), "https://www.novostroyki.example/krasnodar");
    /// assert!(origin.resolve("https://other.example/", origin.root()).is_err());
    /// ```
    pub fn new(base_url: &str) -> UrlResult<Self> {
        let root = normalize_url(base_url)?;
        let host = root.host_str().ok_or(UrlError::MissingHost)?;

        Ok(Self {
            scheme: root.scheme().to_string(),
            host: bare_host(host).to_string(),
            port: root.port_or_known_default(),
            root,
        })
    }

    /// The normalized root page URL
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Returns true when `url` belongs to this site
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.host_str().map(bare_host) == Some(self.host.as_str())
            && url.port_or_known_default() == self.port
    }

    /// Resolves an href found on `page` into a normalized same-origin URL
    pub fn resolve(&self, href: &str, page: &Url) -> UrlResult<Url> {
        let joined = page
            .join(href.trim())
            .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
        let mut normalized = normalize_parsed(joined)?;

        if !self.contains(&normalized) {
            return Err(UrlError::CrossOrigin(normalized.to_string()));
        }

        if normalized.host_str() != self.root.host_str() {
            normalized
                .set_host(self.root.host_str())
                .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;
        }

        Ok(normalized)
    }
}

/// Strips a leading `www.` so both spellings of a host compare equal
fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
