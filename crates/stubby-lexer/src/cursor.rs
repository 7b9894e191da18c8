/// Position in a contract block, moved forward one `char` at a time.
///
/// Offsets are bytes into the source so tokens can slice it directly.
pub struct Cursor<'src> {
    source: &'src str,
    offset: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, offset: 0 }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.offset..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character after [`peek`](Self::peek), used for `1.5` vs `1.a`.
    pub fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    pub fn pos(&self) -> u32 {
        self.offset as u32
    }

    /// Skip the run of characters matching `accept`.
    pub fn eat_while(&mut self, accept: impl Fn(char) -> bool) {
        let run: usize = self
            .rest()
            .chars()
            .take_while(|&c| accept(c))
            .map(char::len_utf8)
            .sum();
        self.offset += run;
    }

    /// Text of an already consumed token. Offsets must lie on char boundaries.
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}
