/// Tokens of a literal SQL fragment.
///
/// #Notes
/// Everything the translator does not care about is lumped into `Text`, which
///  is copied to the output untouched. Only the five constructs below are
///  rewritten.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenType {
    Text,
    BacktickIdentifier, // `ident`
    BracketIdentifier,  // [ident]
    StringSingleQuote,  // 'it''s'
    StringDoubleQuote,  // "say ""hi"""
    LoneQuote,          // a quote that never closes
    Modifier,           // %i, %sn, %and...
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ty: TokenType,

    // Byte indexes into the source
    start: usize,
    end: usize,
}

/// Fragments passed directly in the argument stream may contain `%modifier`
///  markers. Values formatted with `%sql` are scanned again for identifiers
///  and strings only: a `%` inside them is plain text.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Template,
    RawSql,
}

#[inline]
fn is_trigger(b: u8, mode: Mode) -> bool {
    match b {
        b'`' | b'[' | b'\'' | b'"' => true,
        b'%' => mode == Mode::Template,
        _ => false,
    }
}

/// Cheap pre-check: fragments without any trigger character are copied
///  verbatim and never tokenized.
pub fn needs_scan(source: &str, mode: Mode) -> bool {
    source.bytes().any(|b| is_trigger(b, mode))
}

/// This type simply holds a reference to the source and an index, so it's
///  cheap to copy.
///
/// All triggers are ASCII, so every token boundary falls on a char boundary
///  and slicing the source by token is always valid UTF-8.
#[derive(Clone)]
pub struct Lexer<'input> {
    source: &'input str,
    current: usize,
    mode: Mode,
}

impl<'input> Lexer<'input> {
    pub fn new(source: &'input str) -> Self {
        Self::with_mode(source, Mode::Template)
    }

    pub fn with_mode(source: &'input str, mode: Mode) -> Self {
        Self {
            source,
            current: 0,
            mode,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current >= self.source.len()
    }

    #[inline]
    fn bytes(&self) -> &'input [u8] {
        self.source.as_bytes()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes().get(self.current).copied()
    }

    #[inline]
    fn pop_unchecked(&mut self) -> u8 {
        let res = self.bytes()[self.current];
        self.current += 1;
        res
    }

    #[inline]
    pub fn remaining(&self) -> &'input [u8] {
        &self.bytes()[self.current..]
    }

    #[inline]
    fn consume_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while let Some(c) = self.peek()
            && predicate(c)
        {
            self.current += 1;
        }
    }

    /// The opening delimiter has been popped. Identifiers need at least one
    ///  character, so the search for [close] starts one byte further on.
    fn consume_closed(&mut self, close: u8) -> bool {
        let from = self.current + 1;
        if from >= self.source.len() {
            return false;
        }
        match self.bytes()[from..].iter().position(|&b| b == close) {
            Some(at) => {
                self.current = from + at + 1;
                true
            }
            None => false,
        }
    }

    /// The opening quote has been popped. A doubled quote is an escaped
    ///  quote. When the literal never closes, the last doubled quote is
    ///  reinterpreted as "close, then open again" so that as much as possible
    ///  is still a string and only the trailing quote is left alone.
    fn consume_string(&mut self, term: u8) -> bool {
        let bytes = self.bytes();
        let mut last_pair = None;
        let mut i = self.current;
        while i < bytes.len() {
            if bytes[i] == term {
                if bytes.get(i + 1) == Some(&term) {
                    last_pair = Some(i);
                    i += 2;
                    continue;
                }
                self.current = i + 1;
                return true;
            }
            i += 1;
        }
        match last_pair {
            Some(at) => {
                self.current = at + 1;
                true
            }
            None => false,
        }
    }

    /// `%` has been popped. A modifier is one to four ASCII letters that are
    ///  not followed by another letter.
    fn consume_modifier(&mut self) -> bool {
        let len = self
            .remaining()
            .iter()
            .take(5)
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        if (1..=4).contains(&len) {
            self.current += len;
            true
        } else {
            false
        }
    }

    /// Returns the slice of the source that this token was lexed from.
    #[inline]
    pub fn source_of(&self, token: &Token) -> &'input str {
        &self.source[token.start..token.end]
    }

    /// Like [source_of] but omits delimiters: quotes, backticks, brackets and
    ///  the `%` of a modifier.
    #[inline]
    pub fn contents(&self, token: &Token) -> &'input str {
        let s = self.source_of(token);
        match token.ty {
            TokenType::BacktickIdentifier
            | TokenType::BracketIdentifier
            | TokenType::StringSingleQuote
            | TokenType::StringDoubleQuote => &s[1..s.len() - 1],
            TokenType::Modifier => &s[1..],
            TokenType::Text | TokenType::LoneQuote => s,
        }
    }

    /// The value of a string literal token with doubled quotes collapsed.
    pub fn unquoted(&self, token: &Token) -> std::borrow::Cow<'input, str> {
        let s = self.contents(token);
        match token.ty {
            TokenType::StringSingleQuote if s.contains("''") => s.replace("''", "'").into(),
            TokenType::StringDoubleQuote if s.contains("\"\"") => s.replace("\"\"", "\"").into(),
            _ => s.into(),
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.is_empty() {
            return None;
        }
        let start = self.current;
        let mode = self.mode;

        macro_rules! tok {
            ($name:ident) => {{
                Token {
                    ty: TokenType::$name,
                    start,
                    end: self.current,
                }
            }};
        }

        Some(match self.pop_unchecked() {
            b'`' if self.consume_closed(b'`') => tok!(BacktickIdentifier),
            b'[' if self.consume_closed(b']') => tok!(BracketIdentifier),
            term @ (b'\'' | b'"') => {
                if !self.consume_string(term) {
                    tok!(LoneQuote)
                } else if term == b'"' {
                    tok!(StringDoubleQuote)
                } else {
                    tok!(StringSingleQuote)
                }
            }
            b'%' if mode == Mode::Template && self.consume_modifier() => tok!(Modifier),

            // Anything else, including an unclosed backtick or bracket and a
            //  `%` that doesn't start a modifier, runs until the next trigger
            _ => {
                self.consume_while(|b| !is_trigger(b, mode));
                tok!(Text)
            }
        })
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
