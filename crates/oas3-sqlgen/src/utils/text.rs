/// Greedily wraps text at a column width.
///
/// Words are split on whitespace; a word longer than the width is broken at
/// the width boundary, matching the Python `textwrap` behavior the
/// generated docstrings were shaped by.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
  let mut lines: Vec<String> = Vec::new();
  let mut current = String::new();

  for word in text.split_whitespace() {
    let mut word = word;
    loop {
      let needed = if current.is_empty() {
        word.len()
      } else {
        current.len() + 1 + word.len()
      };
      if needed <= width {
        if !current.is_empty() {
          current.push(' ');
        }
        current.push_str(word);
        break;
      }
      if current.is_empty() {
        let (head, tail) = word.split_at(width.min(word.len()));
        lines.push(head.to_string());
        if tail.is_empty() {
          break;
        }
        word = tail;
        continue;
      }
      lines.push(std::mem::take(&mut current));
    }
  }

  if !current.is_empty() {
    lines.push(current);
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::wrap;

  #[test]
  fn short_text_is_single_line() {
    assert_eq!(wrap("The id of the Employee.", 75), vec!["The id of the Employee."]);
  }

  #[test]
  fn long_text_wraps_at_width() {
    let lines = wrap("aa bb cc dd", 5);
    assert_eq!(lines, vec!["aa bb", "cc dd"]);
  }

  #[test]
  fn long_word_is_broken() {
    let lines = wrap("aaaaaaaaaa", 4);
    assert_eq!(lines, vec!["aaaa", "aaaa", "aa"]);
  }

  #[test]
  fn empty_text_produces_no_lines() {
    assert!(wrap("", 75).is_empty());
    assert!(wrap("   ", 75).is_empty());
  }
}
