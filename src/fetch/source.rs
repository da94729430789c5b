use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;

use super::{HttpClient, fetch_bytes};

/// Where the dataset files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRoot {
    /// A local directory holding `<city>_<period>.csv` files.
    Dir(PathBuf),
    /// An HTTP(S) base URL the file names are appended to.
    Url(String),
}

impl SourceRoot {
    /// Anything starting with `http` is a URL, everything else a directory.
    pub fn parse(root: &str) -> Self {
        if root.starts_with("http") {
            SourceRoot::Url(root.trim_end_matches('/').to_string())
        } else {
            SourceRoot::Dir(PathBuf::from(root))
        }
    }

    /// Full path or URL of `file_name` under this root.
    pub fn location(&self, file_name: &str) -> String {
        match self {
            SourceRoot::Dir(dir) => dir.join(file_name).display().to_string(),
            SourceRoot::Url(base) => format!("{base}/{file_name}"),
        }
    }

    /// Reads `file_name` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or fetched, or is not valid UTF-8.
    pub async fn read_text<C: HttpClient + ?Sized>(
        &self,
        client: &C,
        file_name: &str,
    ) -> Result<String> {
        let location = self.location(file_name);
        let bytes = match self {
            SourceRoot::Dir(_) => tokio::fs::read(&location)
                .await
                .with_context(|| format!("reading {location}"))?,
            SourceRoot::Url(_) => fetch_bytes(client, &location)
                .await
                .with_context(|| format!("fetching {location}"))?,
        };
        String::from_utf8(bytes).with_context(|| format!("decoding {location}"))
    }
}

impl fmt::Display for SourceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRoot::Dir(dir) => write!(f, "{}", dir.display()),
            SourceRoot::Url(base) => f.write_str(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use std::env;
    use std::fs;

    #[test]
    fn test_parse_picks_url_or_dir() {
        assert_eq!(
            SourceRoot::parse("https://example.org/data/"),
            SourceRoot::Url("https://example.org/data".to_string())
        );
        assert_eq!(
            SourceRoot::parse("public/data"),
            SourceRoot::Dir(PathBuf::from("public/data"))
        );
    }

    #[test]
    fn test_location() {
        let url = SourceRoot::parse("http://localhost:3000/data");
        assert_eq!(
            url.location("rome_weekends.csv"),
            "http://localhost:3000/data/rome_weekends.csv"
        );
    }

    #[tokio::test]
    async fn test_read_text_from_dir() {
        let dir = env::temp_dir().join("listing_insights_source_test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sample.csv"), "realSum,dist\n1,2\n").unwrap();

        let root = SourceRoot::Dir(dir.clone());
        let text = root.read_text(&BasicClient::new(), "sample.csv").await.unwrap();
        assert!(text.starts_with("realSum"));

        assert!(root.read_text(&BasicClient::new(), "missing.csv").await.is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
