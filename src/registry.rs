//! Topic registry: maps topic ids to a source label and its feed URLs.

use crate::models::{FetchTask, Topic};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    topics: Vec<Topic>,
}

impl TopicRegistry {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Expand the requested topic ids into fetch tasks.
    ///
    /// Tasks follow registry order, not request order. Unknown ids and feed
    /// URLs that do not parse as http(s) are skipped with a warning.
    pub fn expand(&self, topic_ids: &[String]) -> Vec<FetchTask> {
        for id in topic_ids {
            if self.get(id).is_none() {
                warn!(topic = %id, "Unknown topic id; ignoring");
            }
        }

        let tasks: Vec<FetchTask> = self
            .topics
            .iter()
            .filter(|topic| topic_ids.iter().any(|id| *id == topic.id))
            .flat_map(|topic| {
                topic
                    .feed_urls
                    .iter()
                    .filter(|url| {
                        let ok = is_http_url(url);
                        if !ok {
                            warn!(topic = %topic.id, %url, "Skipping invalid feed URL");
                        }
                        ok
                    })
                    .map(|url| FetchTask::new(url.as_str(), topic.name.as_str()))
            })
            .collect();

        debug!(requested = topic_ids.len(), tasks = tasks.len(), "Expanded topics");
        tasks
    }

    /// The default topic list shipped with the binary.
    pub fn builtin() -> Self {
        let topic = |id: &str, name: &str, category: &str, urls: &[&str]| Topic {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            feed_urls: urls.iter().map(|u| u.to_string()).collect(),
        };

        Self::new(vec![
            topic(
                "slovakia_news",
                "Slovak News",
                "Slovakia",
                &[
                    "https://www.aktuality.sk/rss/",
                    "https://domov.sme.sk/rss/rss.xml",
                    "https://dennikn.sk/feed/",
                ],
            ),
            topic(
                "new_ai_models",
                "New AI Models",
                "AI & Tech",
                &[
                    "https://huggingface.co/blog/feed.xml",
                    "https://openai.com/blog/rss.xml",
                ],
            ),
            topic(
                "ai_industry",
                "AI Industry",
                "AI & Tech",
                &[
                    "https://techcrunch.com/category/artificial-intelligence/feed/",
                    "https://www.theverge.com/rss/index.xml",
                ],
            ),
            topic(
                "cybersecurity",
                "Cybersecurity",
                "AI & Tech",
                &[
                    "https://krebsonsecurity.com/feed/",
                    "https://thehackernews.com/rss.xml",
                ],
            ),
            topic(
                "startups",
                "Startups & VC",
                "Business",
                &[
                    "https://feeds.feedburner.com/entrepreneur/latest",
                    "http://feeds.feedburner.com/TechCrunch/startups",
                ],
            ),
            topic(
                "world_politics",
                "World Politics",
                "Society",
                &[
                    "https://feeds.bbci.co.uk/news/world/rss.xml",
                    "https://www.politico.eu/feed/",
                ],
            ),
            topic(
                "science",
                "Science & Innovation",
                "Science",
                &[
                    "https://www.sciencedaily.com/rss/top_news.xml",
                    "https://www.wired.com/feed/category/science/latest/rss",
                ],
            ),
            topic(
                "space",
                "Space & Aviation",
                "Science",
                &["https://www.space.com/feeds/all", "https://spacenews.com/feed/"],
            ),
            topic(
                "renewable_energy",
                "Renewable Energy",
                "Science",
                &[
                    "https://cleantechnica.com/feed/",
                    "https://www.renewableenergyworld.com/feed/",
                ],
            ),
        ])
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}
