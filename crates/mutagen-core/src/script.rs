//! Statement splitting for script mutations

/// Split script text into executable statements
///
/// Lines whose trimmed text starts with `--` or `//` are comments. A line
/// containing `;` closes the current statement at its last `;`; whatever
/// follows starts the next one. Whitespace-only leftovers are dropped.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.starts_with("//") {
            continue;
        }

        if let Some(index) = line.rfind(';') {
            current.push('\n');
            current.push_str(&line[..=index]);
            push_statement(&mut statements, &current);
            current = line[index + 1..].to_string();
        } else {
            current.push('\n');
            current.push_str(line);
        }
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() && text != ";" {
        statements.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons() {
        let script = "CREATE TABLE a (id int PRIMARY KEY);\nINSERT INTO a (id) VALUES (1);\n";
        assert_eq!(
            split_statements(script),
            vec![
                "CREATE TABLE a (id int PRIMARY KEY);",
                "INSERT INTO a (id) VALUES (1);"
            ]
        );
    }

    #[test]
    fn skips_comment_lines() {
        let script = "-- header\n// note\nCREATE TABLE a (id int);\n";
        assert_eq!(split_statements(script), vec!["CREATE TABLE a (id int);"]);
    }

    #[test]
    fn joins_multiline_statements() {
        let script = "CREATE TABLE a (\n  id int\n);";
        assert_eq!(split_statements(script), vec!["CREATE TABLE a (\n  id int\n);"]);
    }

    #[test]
    fn text_after_last_semicolon_starts_next_statement() {
        let script = "DROP TABLE a; CREATE TABLE b (id int)\n;";
        // The first line splits at its last `;`, which is the only one.
        assert_eq!(
            split_statements(script),
            vec!["DROP TABLE a;", "CREATE TABLE b (id int)\n;"]
        );
    }

    #[test]
    fn unterminated_tail_is_kept() {
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1"]);
        assert!(split_statements("\n\n-- nothing\n").is_empty());
    }
}
