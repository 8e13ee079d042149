use crate::error::Position;

/// Character reader over a string slice with line/char tracking and a
/// single level of pushback.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    /// Byte offset of the next unread character
    offset: usize,
    pos: Position,
    /// Offset and position before the most recent `read`
    last: Option<(usize, Position)>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Cursor {
            input,
            offset: 0,
            pos: Position::start(),
            last: None,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.offset..]
    }

    /// Position of the next unread character.
    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// The next two characters, without consuming them.
    pub fn peek2(&self) -> (Option<char>, Option<char>) {
        let mut chars = self.remaining().chars();
        (chars.next(), chars.next())
    }

    /// Consume the next character. Returns `None` at end of input, after
    /// which `unread` has nothing to restore.
    pub fn read(&mut self) -> Option<char> {
        let Some(ch) = self.peek() else {
            self.last = None;
            return None;
        };
        self.last = Some((self.offset, self.pos));
        self.offset += ch.len_utf8();
        self.pos.advance(ch);
        Some(ch)
    }

    /// Push back the most recently read character.
    pub fn unread(&mut self) {
        if let Some((offset, pos)) = self.last.take() {
            self.offset = offset;
            self.pos = pos;
        }
    }
}
