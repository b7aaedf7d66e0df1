//! Conversation messages and the per-session transcript.

use serde::{Deserialize, Serialize};

/// A single turn in a document conversation.
///
/// Each message pairs a role with text content. The two roles used by the
/// question-answering flow are [`Message::STUDENT`] (the asker) and
/// [`Message::LECTURER`] (the answerer).
///
/// # Examples
///
/// ```
/// use lectern::message::Message;
///
/// let question = Message::student("What does the mitochondria produce?");
/// assert_eq!(question.role, Message::STUDENT);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// Role of the person asking questions about the document.
    pub const STUDENT: &'static str = "student";
    /// Role of the assistant answering from the document.
    pub const LECTURER: &'static str = "lecturer";

    /// Creates a message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a student (asker) message.
    #[must_use]
    pub fn student(content: &str) -> Self {
        Self::new(Self::STUDENT, content)
    }

    /// Creates a lecturer (answerer) message.
    #[must_use]
    pub fn lecturer(content: &str) -> Self {
        Self::new(Self::LECTURER, content)
    }
}

/// Capacity-bounded, append-only record of a session's conversation.
///
/// Every answered question appends two turns: the student's question followed
/// by the lecturer's answer. When the transcript grows past `max_turns`, the
/// oldest turns are dropped so prompt context stays bounded.
#[derive(Clone, Debug)]
pub struct Transcript {
    turns: Vec<Message>,
    max_turns: usize,
}

impl Transcript {
    /// Creates an empty transcript holding at most `max_turns` messages.
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Records a question/answer exchange, in that order.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.turns.push(Message::student(question));
        self.turns.push(Message::lecturer(answer));
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }

    /// The recorded turns, oldest first.
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the transcript as prompt-ready text, one `role: content` line
    /// per turn.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&turn.role);
            out.push_str(": ");
            out.push_str(&turn.content);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_appends_question_then_answer() {
        let mut transcript = Transcript::new(16);
        transcript.record_exchange("What produces ATP?", "The mitochondria.");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0], Message::student("What produces ATP?"));
        assert_eq!(transcript.turns()[1], Message::lecturer("The mitochondria."));
    }

    #[test]
    fn render_keeps_turn_order() {
        let mut transcript = Transcript::new(16);
        transcript.record_exchange("q1", "a1");
        transcript.record_exchange("q2", "a2");
        assert_eq!(
            transcript.render(),
            "student: q1\nlecturer: a1\nstudent: q2\nlecturer: a2"
        );
    }

    #[test]
    fn oldest_turns_drop_past_capacity() {
        let mut transcript = Transcript::new(4);
        transcript.record_exchange("q1", "a1");
        transcript.record_exchange("q2", "a2");
        transcript.record_exchange("q3", "a3");
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.turns()[0], Message::student("q2"));
        assert_eq!(transcript.turns()[3], Message::lecturer("a3"));
    }

    #[test]
    fn empty_transcript_renders_empty() {
        let transcript = Transcript::new(4);
        assert!(transcript.is_empty());
        assert_eq!(transcript.render(), "");
    }
}
