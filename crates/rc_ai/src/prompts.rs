pub fn summary_prompt(text: &str) -> String {
    format!(
        r#"Please provide a concise summary in plain text of the following content:

{text}"#
    )
}

pub fn structured_reasoning_prompt(text: &str) -> String {
    // The reply is returned unparsed, so only the layout is suggested.
    format!(
        r#"Extract a short summary, 3 main claims, and evidence bullets from the text below.

Output:
- A "Summary:" paragraph.
- A "Claims:" list with exactly 3 bullets.
- An "Evidence:" list of bullets quoting or paraphrasing the text.

Text:
{text}"#
    )
}
