use serde::{Deserialize, Serialize};

/// Which slice of the post collection the feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostFilter {
    /// Curated posts carrying the reserved tag, most shared first.
    #[default]
    Trending,
    /// Everything else, newest first.
    Recent,
}

impl std::fmt::Display for PostFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostFilter::Trending => write!(f, "trending"),
            PostFilter::Recent => write!(f, "recent"),
        }
    }
}

impl std::str::FromStr for PostFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trending" | "trend" | "hot" => Ok(PostFilter::Trending),
            "recent" | "new" | "latest" => Ok(PostFilter::Recent),
            _ => Err(format!("Invalid post filter: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!("Trending".parse::<PostFilter>().unwrap(), PostFilter::Trending);
        assert_eq!("recent".parse::<PostFilter>().unwrap(), PostFilter::Recent);
        assert!("popular".parse::<PostFilter>().is_err());
        assert_eq!(PostFilter::default(), PostFilter::Trending);
    }
}
