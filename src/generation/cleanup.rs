/// The only fence recognised; other tags pass through untouched.
const HTML_FENCE: &str = "```html";

/// Strips an ```` ```html ```` fence and unescapes literal `\n` sequences.
///
/// Text without the fence is returned as-is, which is how conversational
/// replies survive. The output never contains the fence tag, so applying
/// this twice is the same as applying it once.
pub fn strip_html_fence(text: &str) -> String {
    if !text.contains(HTML_FENCE) {
        return text.to_string();
    }

    let mut code = text
        .replace("```html\n", "")
        .replace("\n```", "")
        .replace("\\n", "\n");
    // Removing one tag can splice backticks into a new one.
    while code.contains(HTML_FENCE) {
        code = code.replace(HTML_FENCE, "");
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_html() {
        let raw = "```html\n<html>\n<body>Bakery</body>\n</html>\n```";
        assert_eq!(
            strip_html_fence(raw),
            "<html>\n<body>Bakery</body>\n</html>"
        );
    }

    #[test]
    fn unescapes_literal_newlines_inside_fence() {
        let raw = "```html\n<div>a</div>\\n<div>b</div>\n```";
        assert_eq!(strip_html_fence(raw), "<div>a</div>\n<div>b</div>");
    }

    #[test]
    fn removes_fence_without_trailing_newline() {
        assert_eq!(strip_html_fence("```html<p>x</p>```"), "<p>x</p>```");
    }

    #[test]
    fn conversational_text_passes_through() {
        let reply = "I'm a website builder. Ask me for a site!\\n";
        assert_eq!(strip_html_fence(reply), reply);
    }

    #[test]
    fn other_fence_tags_pass_through() {
        let reply = "```css\nbody { color: red; }\n```";
        assert_eq!(strip_html_fence(reply), reply);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let samples = [
            "```html\n<html>\\n</html>\n```",
            "plain text",
            "```css\na{}\n```",
            "``\n```html`html",
            "``` ```html`html ```html\n",
            "",
        ];
        for sample in samples {
            let once = strip_html_fence(sample);
            assert_eq!(strip_html_fence(&once), once, "sample: {:?}", sample);
            if sample.contains(HTML_FENCE) {
                assert!(!once.contains(HTML_FENCE));
            }
        }
    }
}
