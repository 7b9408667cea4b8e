/// Escapes the characters Telegram-flavored Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '[' | ']' | '(' | ')' | '~' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
