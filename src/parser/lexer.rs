#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    /// Run of digits, `None` when it does not fit an `i32`.
    Number(Option<i32>),
    Dice,
    Fudge,
    Plus,
    Minus,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Unknown,
    Eof,
}


/// A token with its position in the original input.
///
/// `start` and `end` are char offsets; `width` counts only the
/// non-whitespace chars covered, since whitespace may appear inside a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub width: usize,
}


/// Whitespace-insensitive, case-insensitive tokenizer.
///
/// Whitespace is dropped before scanning, so `2 d 6` reads like `2d6`
/// and `1 0` like `10`.
#[derive(Debug)]
pub(crate) struct Lexer {
    input: Vec<(usize, char)>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars()
                .enumerate()
                .filter(|(_, ch)| !ch.is_whitespace())
                .map(|(i, ch)| (i, ch.to_ascii_lowercase()))
                .collect(),
            position: 0,
        }
    }

    pub fn next_token(&mut self) -> Spanned {
        let Some(&(start, ch)) = self.input.get(self.position) else {
            let end = self.input.last().map_or(0, |(i, _)| i + 1);
            return Spanned { token: Token::Eof, start: end, end, width: 0 };
        };

        let token = match ch {
            '0'..='9' => return self.read_number(),
            '+' => Token::Plus,
            '-' => Token::Minus,
            'd' => Token::Dice,
            'f' => Token::Fudge,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ',' => Token::Comma,
            ':' => Token::Colon,
            _ => Token::Unknown
        };

        self.position += 1;
        Spanned { token, start, end: start + 1, width: 1 }
    }

    /// Collects every token up to, not including, [`Token::Eof`].
    pub fn tokenize(mut self) -> Vec<Spanned> {
        std::iter::from_fn(|| {
            let spanned = self.next_token();
            (spanned.token != Token::Eof).then_some(spanned)
        }).collect()
    }

    fn read_number(&mut self) -> Spanned {
        let first = self.position;
        while self.position < self.input.len() && self.input[self.position].1.is_ascii_digit() {
            self.position += 1;
        }

        let digits = &self.input[first..self.position];
        let number: String = digits.iter().map(|(_, ch)| ch).collect();

        Spanned {
            token: Token::Number(number.parse().ok()),
            start: digits[0].0,
            end: digits[digits.len() - 1].0 + 1,
            width: digits.len(),
        }
    }
}
