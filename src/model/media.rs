//! Media records produced by page fetches

/// One media item found on a listing page
///
/// Records are immutable once created, apart from `extracted`, which the
/// export step flips in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRecord {
    /// nsid of the uploader
    pub owner: String,
    pub title: String,
    pub is_public: bool,
    pub is_safe: bool,
    /// Direct link to the large rendition of the image
    pub download_link: String,
    /// Whether the link has already been exported
    pub extracted: bool,
}

impl MediaRecord {
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        is_public: bool,
        is_safe: bool,
        download_link: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            title: title.into(),
            is_public,
            is_safe,
            download_link: download_link.into(),
            extracted: false,
        }
    }
}

/// Builds the download link for an item
///
/// Format: `{base}/{farm}/{server}/{id}_{secret}_b_d.jpg`
pub fn build_download_link(base: &str, farm: &str, server: &str, id: &str, secret: &str) -> String {
    format!(
        "{}/{}/{}/{}_{}_b_d.jpg",
        base.trim_end_matches('/'),
        farm,
        server,
        id,
        secret
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_not_extracted() {
        let record = MediaRecord::new("1@N01", "Sunset", true, true, "http://x/1.jpg");
        assert!(!record.extracted);
    }

    #[test]
    fn test_build_download_link() {
        let link = build_download_link("http://c1.staticflickr.com/", "5", "4321", "987", "abc");
        assert_eq!(link, "http://c1.staticflickr.com/5/4321/987_abc_b_d.jpg");

        let link = build_download_link("http://c1.staticflickr.com", "5", "4321", "987", "abc");
        assert_eq!(link, "http://c1.staticflickr.com/5/4321/987_abc_b_d.jpg");
    }
}
