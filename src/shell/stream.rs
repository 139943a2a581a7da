use std::io::{self, BufRead, Write};

/// Line source for the shell loop.
///
/// Interactive streams write the prompt before every read; piped input
/// is read silently.
pub struct InputStream<R> {
    reader: R,
    interactive: bool,
    line: String,
}

impl<R: BufRead> InputStream<R> {
    pub fn new(reader: R, interactive: bool) -> Self {
        Self {
            reader,
            interactive,
            line: String::new(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Read the next line without its line ending, or `None` at end of input.
    pub fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<Option<&str>> {
        if self.interactive {
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n'])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piped_input_has_no_prompt() {
        let mut stream = InputStream::new("a\nb\r\n".as_bytes(), false);
        let mut out = Vec::new();
        assert_eq!(stream.read_line("$ ", &mut out).unwrap(), Some("a"));
        assert_eq!(stream.read_line("$ ", &mut out).unwrap(), Some("b"));
        assert_eq!(stream.read_line("$ ", &mut out).unwrap(), None);
        assert!(out.is_empty());
    }

    #[test]
    fn interactive_input_prompts_each_read() {
        let mut stream = InputStream::new("x".as_bytes(), true);
        let mut out = Vec::new();
        assert_eq!(stream.read_line("$ ", &mut out).unwrap(), Some("x"));
        assert_eq!(stream.read_line("> ", &mut out).unwrap(), None);
        assert_eq!(out, b"$ > ");
    }

    #[test]
    fn blank_line_is_not_end_of_input() {
        let mut stream = InputStream::new("\n".as_bytes(), false);
        let mut out = Vec::new();
        assert_eq!(stream.read_line("", &mut out).unwrap(), Some(""));
        assert_eq!(stream.read_line("", &mut out).unwrap(), None);
    }
}
