use crate::constants::persona::{
    MIN_MEMORY_RESPONSE_CHARS, RECENCY_WEIGHT, SALIENCY_WEIGHT, UNTITLED_CONVERSATION,
};
use crate::error::ThroneError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const MAX_KEY_TOPICS: usize = 50;
const TOP_TOPICS: usize = 10;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One conversation from a chat-export archive (`conversations.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ArchivedConversation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub create_time: Option<f64>,
    #[serde(default)]
    pub update_time: Option<f64>,
    #[serde(default)]
    pub mapping: BTreeMap<String, ArchiveNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveNode {
    #[serde(default)]
    pub message: Option<ArchiveMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveMessage {
    pub author: ArchiveAuthor,
    #[serde(default)]
    pub create_time: Option<f64>,
    pub content: ArchiveContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveAuthor {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveContent {
    #[serde(default)]
    pub parts: Vec<Value>,
}

impl ArchiveMessage {
    /// Text parts joined with a space; non-text parts are skipped.
    pub fn text(&self) -> String {
        self.content
            .parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ArchivedConversation {
    /// Messages in chronological order; ties keep node-id order.
    pub fn messages(&self) -> Vec<&ArchiveMessage> {
        let mut messages: Vec<&ArchiveMessage> = self
            .mapping
            .values()
            .filter_map(|node| node.message.as_ref())
            .collect();
        messages.sort_by(|a, b| {
            a.create_time
                .unwrap_or(0.0)
                .total_cmp(&b.create_time.unwrap_or(0.0))
        });
        messages
    }

    pub fn message_count(&self) -> usize {
        self.mapping.values().filter(|n| n.message.is_some()).count()
    }

    fn titled(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty() && *t != UNTITLED_CONVERSATION)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArchiveStats {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub span_days: i64,
    pub top_topics: Vec<String>,
}

/// A loaded conversation archive used to seed the memory-augmented prompt.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    pub conversations: Vec<ArchivedConversation>,
}

impl MemoryArchive {
    pub fn load(path: &Path) -> Result<Self, ThroneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ThroneError> {
        let conversations: Vec<ArchivedConversation> = serde_json::from_str(content)?;
        Ok(Self { conversations })
    }

    pub fn total_messages(&self) -> usize {
        self.conversations.iter().map(|c| c.message_count()).sum()
    }

    /// Earliest and latest message timestamps, in epoch seconds.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        self.conversations
            .iter()
            .flat_map(|c| c.mapping.values())
            .filter_map(|n| n.message.as_ref().and_then(|m| m.create_time))
            .fold(None, |range, t| match range {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })
    }

    /// Distinct lowercase title words longer than three characters, in
    /// first-seen order.
    pub fn key_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = Vec::new();
        for title in self.conversations.iter().filter_map(|c| c.titled()) {
            for word in title.to_lowercase().split_whitespace() {
                if word.chars().count() > 3 && !topics.iter().any(|t| t == word) {
                    topics.push(word.to_string());
                }
            }
        }
        topics.truncate(MAX_KEY_TOPICS);
        topics
    }

    pub fn stats(&self) -> ArchiveStats {
        let span_days = self
            .time_range()
            .map(|(lo, hi)| ((hi - lo) / SECONDS_PER_DAY).ceil() as i64)
            .unwrap_or(0);
        let mut top_topics = self.key_topics();
        top_topics.truncate(TOP_TOPICS);
        ArchiveStats {
            total_conversations: self.conversations.len(),
            total_messages: self.total_messages(),
            span_days,
            top_topics,
        }
    }

    /// Conversations ordered by `message_count * 0.7 + normalized_recency * 0.3`,
    /// highest first. Recency is min-max normalized over the archive; equal
    /// scores keep archive order.
    pub fn ranked(&self) -> Vec<&ArchivedConversation> {
        let times: Vec<f64> = self
            .conversations
            .iter()
            .map(|c| c.update_time.unwrap_or(0.0))
            .collect();
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let spread = max - min;

        let mut scored: Vec<(&ArchivedConversation, f64)> = self
            .conversations
            .iter()
            .zip(times.iter())
            .map(|(conv, &t)| {
                let recency = if spread > 0.0 { (t - min) / spread } else { 1.0 };
                let score =
                    conv.message_count() as f64 * SALIENCY_WEIGHT + recency * RECENCY_WEIGHT;
                (conv, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().map(|(conv, _)| conv).collect()
    }

    /// Memory strings for the top `limit` ranked conversations that carry a
    /// real title. Only the first two assistant replies are considered, and
    /// short ones among them are dropped.
    pub fn extract_key_memories(&self, limit: usize) -> Vec<String> {
        self.ranked()
            .into_iter()
            .take(limit)
            .filter_map(|conv| {
                let title = conv.titled()?;
                let responses: Vec<String> = conv
                    .messages()
                    .into_iter()
                    .filter(|m| m.author.role == "assistant")
                    .take(2)
                    .map(ArchiveMessage::text)
                    .filter(|text| text.chars().count() > MIN_MEMORY_RESPONSE_CHARS)
                    .collect();
                if responses.is_empty() {
                    None
                } else {
                    Some(format!(
                        "Topic: {}\nKey responses: {}",
                        title,
                        responses.join(" ... ")
                    ))
                }
            })
            .collect()
    }
}
