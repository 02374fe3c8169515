//! Character cursor over config text with line tracking

/// Character-level reader used by the tokenizer
///
/// `line` is 1-based. `\n`, `\r` and `\r\n` each end exactly one line.
#[derive(Debug, Clone)]
pub struct Reader {
    body: Vec<char>,
    index: usize,
    line: usize,
}

impl Reader {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.chars().collect(),
            index: 0,
            line: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn peek(&self) -> Option<char> {
        self.body.get(self.index).copied()
    }

    pub fn read(&mut self) -> Option<char> {
        let c = self.peek()?;
        if self.ends_line_at(self.index) {
            self.line += 1;
        }
        self.index += 1;
        Some(c)
    }

    /// Push back the last character read
    pub fn back(&mut self) {
        if self.index == 0 {
            return;
        }
        self.index -= 1;
        if self.ends_line_at(self.index) {
            self.line -= 1;
        }
    }

    /// Consume and return text up to, not including, the first char matching `is_end`
    ///
    /// The matching char is left unread. Without a match the rest of the
    /// input is returned.
    pub fn read_until(&mut self, mut is_end: impl FnMut(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_end(c) {
                break;
            }
            self.read();
            text.push(c);
        }
        text
    }

    /// Whether the char at `index` counts as a line break
    ///
    /// A `\n` directly after `\r` belongs to the same break.
    fn ends_line_at(&self, index: usize) -> bool {
        match self.body.get(index) {
            Some('\r') => true,
            Some('\n') => index == 0 || self.body[index - 1] != '\r',
            _ => false,
        }
    }
}
