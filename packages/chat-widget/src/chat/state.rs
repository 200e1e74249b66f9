//! Conversation state published by the chat core.

use indexmap::IndexMap;

use crate::types::{Message, MessageStatus};

/// Chronological messages, indexed by id.
///
/// Every mutation goes through the id, never through a position, so a page
/// prepend and a send settling in between cannot disturb each other.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: IndexMap<String, Message>,
}

impl PartialEq for MessageLog {
    // IndexMap equality ignores order; the log's order is part of its value.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.values().eq(other.entries.values())
    }
}

impl MessageLog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.entries.values()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last().map(|(_, m)| m)
    }

    /// Append at the end. A message whose id is already present replaces the
    /// existing entry in place.
    pub fn push(&mut self, message: Message) {
        self.entries.insert(message.id.clone(), message);
    }

    /// Put older messages, already in chronological order, before the log.
    /// Ids already present keep their current entry.
    pub fn prepend(&mut self, older: impl IntoIterator<Item = Message>) {
        let mut merged: IndexMap<String, Message> = IndexMap::new();
        for message in older {
            if !self.entries.contains_key(&message.id) && !merged.contains_key(&message.id) {
                merged.insert(message.id.clone(), message);
            }
        }
        merged.extend(std::mem::take(&mut self.entries));
        self.entries = merged;
    }

    pub fn remove(&mut self, id: &str) -> Option<Message> {
        self.entries.shift_remove(id)
    }

    /// Set the status of one message. Returns whether it was found.
    pub fn set_status(&mut self, id: &str, status: MessageStatus) -> bool {
        match self.entries.get_mut(id) {
            Some(message) => {
                message.status = Some(status);
                true
            }
            None => false,
        }
    }

    /// Messages still waiting for the server.
    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.entries.values().filter(|m| m.is_pending())
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.entries.values().cloned().collect()
    }
}

impl FromIterator<Message> for MessageLog {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        let mut log = MessageLog::default();
        for message in iter {
            log.push(message);
        }
        log
    }
}

/// Everything the views need to render a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    pub is_open: bool,
    pub messages: MessageLog,
    /// A page fetch is in flight.
    pub is_loading: bool,
    /// Waiting for an assistant reply.
    pub is_typing: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            is_open: false,
            messages: MessageLog::default(),
            is_loading: false,
            is_typing: false,
            error: None,
            has_more: true,
            next_cursor: None,
        }
    }
}

impl ChatState {
    /// Nothing to show yet and nothing on the way.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && !self.is_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    fn msg(id: &str) -> Message {
        Message::new(id, MessageRole::User, id)
    }

    fn ids(log: &MessageLog) -> Vec<&str> {
        log.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn prepend_keeps_chronological_order() {
        let mut log: MessageLog = [msg("m3"), msg("m4")].into_iter().collect();
        // Server order is newest first; the caller reverses it.
        let page = vec![msg("m2"), msg("m1")];
        log.prepend(page.into_iter().rev());
        assert_eq!(ids(&log), ["m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn prepend_skips_ids_already_present() {
        let mut log: MessageLog = [msg("m2"), msg("m3")].into_iter().collect();
        log.prepend([msg("m1"), Message::new("m2", MessageRole::User, "stale")]);
        assert_eq!(ids(&log), ["m1", "m2", "m3"]);
        assert_eq!(log.get("m2").unwrap().content, "m2");
    }

    #[test]
    fn remove_and_push_work_by_id() {
        let mut log: MessageLog = [msg("a"), msg("temp"), msg("b")].into_iter().collect();
        assert!(log.remove("temp").is_some());
        log.push(msg("c"));
        assert_eq!(ids(&log), ["a", "b", "c"]);
        assert!(log.remove("missing").is_none());
    }

    #[test]
    fn equality_is_order_sensitive() {
        let ab: MessageLog = [msg("a"), msg("b")].into_iter().collect();
        let ba: MessageLog = [msg("b"), msg("a")].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn fresh_state_expects_history() {
        let state = ChatState::default();
        assert!(state.has_more);
        assert!(!state.is_open);
        assert!(state.is_empty());
    }
}
