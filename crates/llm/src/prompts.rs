//! Prompt for teacher guide generation.
//!
//! The section hierarchy here is the one `guide_core::Guide::from_html`
//! and the PDF renderer expect, so the headings must stay in step with them.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:html)?\s*").unwrap());

static TRAILING_FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```$").unwrap());

/// Build the generation prompt for one deck.
pub fn teacher_guide_prompt(file_name: &str, slide_text: &str) -> String {
    format!(
        r#"You are a professional curriculum designer.

Generate a complete Teacher Guide in clean semantic HTML format.

IMPORTANT RULES:
- Return ONLY HTML.
- Do NOT wrap in markdown.
- Do NOT add explanations.
- Use <h1>, <h2>, <h3>, <p>, <ul>, <li>, <strong>.
- Follow the exact hierarchy provided below.

Structure:

<h1>Session Title</h1>

<h2>Session Overview</h2>
<p>...</p>

<h2>Learning Objectives</h2>
<ul>
  <li>...</li>
</ul>

<h2>Preparation</h2>
<p>...</p>

<h2>Lesson Procedure</h2>
<h3>Initiate</h3>
<p>...</p>

<h3>Learn</h3>
<p>...</p>

<h3>Make</h3>
<p>...</p>

<h3>Share</h3>
<p>...</p>

<h2>Glossary</h2>
<ul>
  <li><strong>Term:</strong> Definition</li>
</ul>

<h2>Bonus Activities</h2>
<p>...</p>

Use clear academic language similar to an official Teacher Guide.
Audience: Write for TEACHERS, not students.

FILE NAME: {file_name}

Session content:
{slide_text}
"#
    )
}

/// Trim model output and drop a surrounding markdown code fence.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_leading = LEADING_FENCE_REGEX.replace(trimmed, "");
    TRAILING_FENCE_REGEX
        .replace(&without_leading, "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_substitutes_inputs() {
        let prompt = teacher_guide_prompt("Intro_AI", "--- Slide 1 ---\nWhat is AI?");
        assert!(prompt.contains("FILE NAME: Intro_AI\n"));
        assert!(prompt.ends_with("Session content:\n--- Slide 1 ---\nWhat is AI?\n"));
        assert!(prompt.contains("<h3>Initiate</h3>"));
    }

    #[test]
    fn test_prompt_leaves_braces_in_inputs_alone() {
        let prompt = teacher_guide_prompt("{slide_text}", "{file_name}");
        assert!(prompt.contains("FILE NAME: {slide_text}"));
        assert!(prompt.contains("Session content:\n{file_name}"));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```html\n<h1>T</h1>\n```"), "<h1>T</h1>");
        assert_eq!(strip_code_fences("```HTML<p>x</p>```"), "<p>x</p>");
        assert_eq!(strip_code_fences("```\n<p>x</p>\n```\n"), "<p>x</p>");
        assert_eq!(strip_code_fences("  <h1>T</h1>  "), "<h1>T</h1>");
    }
}
