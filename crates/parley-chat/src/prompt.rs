//! Prompt assembly: flattening a turn, rule text, and attached files into
//! the single input string the backend receives

use std::borrow::Cow;

use crate::conversation::{Turn, TurnFile};

/// Delimiters are fixed configuration constants, never content-derived
pub const SYSTEM_PROMPT_DELIMITER: &str = "=== SYSTEM ===\n";
pub const USER_INPUT_DELIMITER: &str = "\n=== USER ===\n";
pub const FILE_NAME_DELIMITER: &str = "\n=== FILE ===\n";
pub const FILE_CONTENT_DELIMITER: &str = "\n=== FILE CONTENT ===\n";

/// Base system prompt prepended to every request
pub const BASE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer using the conversation so far and any attached file content.";

/// Input variants that assemble identically modulo the source object
#[derive(Debug, Clone)]
pub enum PromptInput {
    PlainText(String),
    Message(Turn),
    Exam {
        subject: String,
        questions: Vec<String>,
    },
}

impl PromptInput {
    /// Flatten the variant to the text that follows the user-input delimiter
    fn text(&self) -> Cow<'_, str> {
        match self {
            PromptInput::PlainText(text) => Cow::Borrowed(text),
            PromptInput::Message(turn) => Cow::Borrowed(&turn.text),
            PromptInput::Exam { subject, questions } => {
                let mut out = format!("Exam: {subject}");
                for (i, question) in questions.iter().enumerate() {
                    out.push_str(&format!("\n{}. {}", i + 1, question));
                }
                Cow::Owned(out)
            }
        }
    }
}

/// Assemble the backend input: system section, then the user input, then
/// each attached file as a name/content pair, in input order.
///
/// No escaping is performed. If the turn text or a file's text contains a
/// delimiter sequence verbatim the backend may misread the prompt; fixing
/// that would change the wire contract, so the limitation stands.
pub fn assemble(input: &PromptInput, rules: Option<&str>, files: &[TurnFile]) -> String {
    let mut prompt = String::new();
    prompt.push_str(SYSTEM_PROMPT_DELIMITER);
    prompt.push_str(BASE_SYSTEM_PROMPT);
    if let Some(rules) = rules {
        if !rules.is_empty() {
            prompt.push('\n');
            prompt.push_str(rules);
        }
    }
    prompt.push_str(USER_INPUT_DELIMITER);
    prompt.push_str(&input.text());
    for file in files {
        prompt.push_str(FILE_NAME_DELIMITER);
        prompt.push_str(&file.name);
        prompt.push_str(FILE_CONTENT_DELIMITER);
        prompt.push_str(&file.text);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_delimiter_immediately_precedes_input_text() {
        let input = PromptInput::PlainText("What is 2+2?".to_string());
        let prompt = assemble(&input, None, &[]);

        let expected = format!("{USER_INPUT_DELIMITER}What is 2+2?");
        assert!(prompt.contains(&expected));
        assert!(prompt.starts_with(SYSTEM_PROMPT_DELIMITER));
    }

    #[test]
    fn test_rules_sit_between_system_prompt_and_user_input() {
        let input = PromptInput::PlainText("hi".to_string());
        let prompt = assemble(&input, Some("Answer in French."), &[]);

        let rules_at = prompt.find("Answer in French.").unwrap();
        let user_at = prompt.find(USER_INPUT_DELIMITER).unwrap();
        assert!(rules_at < user_at);
    }

    #[test]
    fn test_empty_rules_contribute_nothing() {
        let input = PromptInput::PlainText("hi".to_string());
        assert_eq!(
            assemble(&input, Some(""), &[]),
            assemble(&input, None, &[])
        );
    }

    #[test]
    fn test_one_filename_delimiter_per_file_in_input_order() {
        let files = vec![
            TurnFile::new("notes.txt", "first file"),
            TurnFile::new("essay.pdf", "second file"),
            TurnFile::new("data.csv", "third file"),
        ];
        let input = PromptInput::PlainText("summarize".to_string());
        let prompt = assemble(&input, None, &files);

        assert_eq!(prompt.matches(FILE_NAME_DELIMITER).count(), files.len());
        for file in &files {
            let name_section = format!("{FILE_NAME_DELIMITER}{}", file.name);
            let content_section = format!("{FILE_CONTENT_DELIMITER}{}", file.text);
            assert!(prompt.contains(&name_section));
            assert!(prompt.contains(&content_section));
        }
        // Input order is preserved.
        let first = prompt.find("notes.txt").unwrap();
        let second = prompt.find("essay.pdf").unwrap();
        let third = prompt.find("data.csv").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_message_and_plain_text_assemble_identically() {
        let turn = Turn::user(7, "same words", vec![]);
        let from_turn = assemble(&PromptInput::Message(turn), None, &[]);
        let from_text = assemble(&PromptInput::PlainText("same words".to_string()), None, &[]);
        assert_eq!(from_turn, from_text);
    }

    #[test]
    fn test_exam_variant_numbers_its_questions() {
        let input = PromptInput::Exam {
            subject: "Databases".to_string(),
            questions: vec![
                "Define a transaction.".to_string(),
                "What is write-ahead logging?".to_string(),
            ],
        };
        let prompt = assemble(&input, None, &[]);
        assert!(prompt.contains("Exam: Databases"));
        assert!(prompt.contains("1. Define a transaction."));
        assert!(prompt.contains("2. What is write-ahead logging?"));
    }

    #[test]
    fn test_empty_input_still_carries_user_delimiter() {
        let input = PromptInput::PlainText(String::new());
        let prompt = assemble(&input, None, &[]);
        assert!(prompt.ends_with(USER_INPUT_DELIMITER));
    }
}
