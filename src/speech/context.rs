//! Bounded conversational context for translation consistency.
//!
//! The translator sees prior (source, target) exchanges so terminology stays
//! consistent across calls. The context is owned by the translation worker
//! alone; each successful call appends exactly one (user, assistant) pair.
//! A sliding window caps the pair count, dropping the oldest pair first, so
//! neither memory nor request payloads grow without bound.

use serde::Serialize;

/// Role of a context turn, mirroring chat-completion message roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextTurn {
    pub role: Role,
    pub content: String,
}

impl ContextTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Sliding-window translation context: a fixed system instruction plus at
/// most `max_turns` trailing (user, assistant) pairs.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    system: ContextTurn,
    /// Interleaved user/assistant turns, oldest first. Always even length.
    exchanges: Vec<ContextTurn>,
    max_turns: usize,
}

impl TranslationContext {
    /// Creates a context with the given system instruction and pair cap.
    pub fn new(system_instruction: impl Into<String>, max_turns: usize) -> Self {
        Self {
            system: ContextTurn::new(Role::System, system_instruction),
            exchanges: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Default system instruction for a source→target translation session.
    pub fn for_languages(source: &str, target: &str, max_turns: usize) -> Self {
        let instruction = format!(
            "You are a professional translator. Translate the following {} text into {}. \
             Return only a valid JSON object with exactly one key: 'translation', whose \
             value is the translated text. Do not include any extra text or keys. Use any \
             previous conversation context to maintain consistency.",
            source, target
        );
        Self::new(instruction, max_turns)
    }

    /// Records one completed exchange, evicting the oldest pair when the
    /// window is full.
    pub fn push_exchange(&mut self, source_text: &str, target_text: &str) {
        self.exchanges.push(ContextTurn::new(Role::User, source_text));
        self.exchanges
            .push(ContextTurn::new(Role::Assistant, target_text));

        while self.exchanges.len() / 2 > self.max_turns {
            self.exchanges.drain(..2);
        }
    }

    /// Number of retained (user, assistant) pairs.
    pub fn pair_count(&self) -> usize {
        self.exchanges.len() / 2
    }

    /// All turns in request order: system first, then exchanges oldest
    /// first, then the pending user text.
    pub fn turns_with_pending(&self, pending_source: &str) -> Vec<ContextTurn> {
        let mut turns = Vec::with_capacity(self.exchanges.len() + 2);
        turns.push(self.system.clone());
        turns.extend(self.exchanges.iter().cloned());
        turns.push(ContextTurn::new(Role::User, pending_source));
        turns
    }

    /// All retained turns without a pending message.
    pub fn turns(&self) -> Vec<ContextTurn> {
        let mut turns = Vec::with_capacity(self.exchanges.len() + 1);
        turns.push(self.system.clone());
        turns.extend(self.exchanges.iter().cloned());
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_by_exactly_two_entries_per_exchange() {
        let mut context = TranslationContext::new("translate", 8);
        assert_eq!(context.turns().len(), 1); // system only

        context.push_exchange("раз", "one");
        assert_eq!(context.turns().len(), 3);
        assert_eq!(context.pair_count(), 1);

        context.push_exchange("два", "two");
        assert_eq!(context.turns().len(), 5);
        assert_eq!(context.pair_count(), 2);
    }

    #[test]
    fn turns_preserve_exchange_order() {
        let mut context = TranslationContext::new("translate", 8);
        context.push_exchange("раз", "one");
        context.push_exchange("два", "two");

        let turns = context.turns();
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1], ContextTurn::new(Role::User, "раз"));
        assert_eq!(turns[2], ContextTurn::new(Role::Assistant, "one"));
        assert_eq!(turns[3], ContextTurn::new(Role::User, "два"));
        assert_eq!(turns[4], ContextTurn::new(Role::Assistant, "two"));
    }

    #[test]
    fn sliding_window_drops_oldest_pair() {
        let mut context = TranslationContext::new("translate", 2);
        context.push_exchange("a", "1");
        context.push_exchange("b", "2");
        context.push_exchange("c", "3");

        assert_eq!(context.pair_count(), 2);
        let turns = context.turns();
        // Oldest pair ("a", "1") was evicted; system turn survives.
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].content, "b");
        assert_eq!(turns[4].content, "3");
    }

    #[test]
    fn pending_source_is_appended_last() {
        let mut context = TranslationContext::new("translate", 4);
        context.push_exchange("a", "1");

        let turns = context.turns_with_pending("b");
        assert_eq!(turns.last().unwrap(), &ContextTurn::new(Role::User, "b"));
        // Pending text is not retained until the exchange completes.
        assert_eq!(context.pair_count(), 1);
    }

    #[test]
    fn zero_cap_is_clamped_to_one() {
        let mut context = TranslationContext::new("translate", 0);
        context.push_exchange("a", "1");
        context.push_exchange("b", "2");
        assert_eq!(context.pair_count(), 1);
    }

    #[test]
    fn for_languages_mentions_both_codes() {
        let context = TranslationContext::for_languages("Russian", "English", 4);
        let system = &context.turns()[0];
        assert!(system.content.contains("Russian"));
        assert!(system.content.contains("English"));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
