//! The four fixed trending posts that bootstrap an empty feed.

use serde_json::json;

use crate::backend::Fields;

/// Author id recorded on seed posts.
pub const SEED_AUTHOR: &str = "system";

#[derive(Debug, Clone, Copy)]
pub struct SeedPost {
    pub title: &'static str,
    pub content: &'static str,
    pub author_name: &'static str,
    pub share_count: u64,
}

pub const SEED_POSTS: [SeedPost; 4] = [
    SeedPost {
        title: "Why JavaScript is Like a Box of Chocolates",
        content: "You never know what you're gonna get...",
        author_name: "Console.log Enthusiast",
        share_count: 420,
    },
    SeedPost {
        title: "CSS: Where Dreams Go to Float",
        content: "Just spent 5 hours centering a div. Started with flex, moved to grid, ended up with margin: 0 auto. Sometimes I think CSS stands for Complete Styling Sorcery. #CSSBattles #DivLife",
        author_name: "Div Whisperer",
        share_count: 369,
    },
    SeedPost {
        title: "React UseState of Mind",
        content: "My component re-rendered so many times it started a boy band called 'Infinite Loop'. Now taking bookings for your next deployment! #ReactJS #InfiniteRerender",
        author_name: "useState Philosopher",
        share_count: 666,
    },
    SeedPost {
        title: "Git Push & Pray Protocol",
        content: "Just force pushed to main because I'm a rebel. If anyone needs me, I'll be updating my LinkedIn profile. #GitLife #YOLODeploy",
        author_name: "Branch Breaker",
        share_count: 777,
    },
];

impl SeedPost {
    pub fn to_fields(&self, tag: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(self.title));
        fields.insert("content".to_string(), json!(self.content));
        fields.insert("author".to_string(), json!(SEED_AUTHOR));
        fields.insert("authorName".to_string(), json!(self.author_name));
        fields.insert("likes".to_string(), json!(0));
        fields.insert("shareCount".to_string(), json!(self.share_count));
        fields.insert("tags".to_string(), json!([tag]));
        fields.insert("comments".to_string(), json!([]));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_titles_are_unique() {
        let mut titles: Vec<&str> = SEED_POSTS.iter().map(|s| s.title).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), SEED_POSTS.len());
    }

    #[test]
    fn test_seed_fields_carry_tag() {
        let fields = SEED_POSTS[3].to_fields("trend");
        assert_eq!(fields["tags"], json!(["trend"]));
        assert_eq!(fields["shareCount"], json!(777));
        assert_eq!(fields["author"], json!("system"));
    }
}
