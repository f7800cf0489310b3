//! Text-to-tree parsing
//!
//! The grammar is tiny: integers, the variables `x y z w`, parentheses,
//! unary minus, and the binary operators `+ - * ^`.  Juxtaposition is
//! multiplication (`3x`, `2(x+y)`, `x y`).  Powers bind tightest and are
//! right-associative; multiplication comes next; addition and subtraction
//! are left-associative and bind loosest.
//!
//! Parsing runs in two stages.  A scanner splits one parenthesis level into
//! alternating terms and operators (recursing into parenthesized groups), then
//! three reduction passes fold the operators by precedence.
use super::{Expr, Opcode, Var};
use crate::Error;

/// Parses a polynomial from text
///
/// ```
/// # use projective::expr::parse;
/// let e = parse("2(x + 1)^2 - y")?;
/// assert_eq!(e.eval(1.0, 3.0, 0.0, 0.0), 5.0);
/// # Ok::<(), projective::Error>(())
/// ```
///
/// # Errors
/// Returns [`Error::MalformedExpression`] with a short human-readable
/// message describing the first problem found.
pub fn parse(text: &str) -> Result<Expr, Error> {
    parse_group(text.as_bytes())
}

fn parse_group(text: &[u8]) -> Result<Expr, Error> {
    let mut scanner = Scanner { text, pos: 0 };
    let (mut terms, mut ops) = scanner.run()?;

    fold_powers(&mut terms, &mut ops)?;
    fold_left(&mut terms, &mut ops, |op| op == Opcode::Mul);
    fold_left(&mut terms, &mut ops, |op| {
        matches!(op, Opcode::Add | Opcode::Sub)
    });

    // The scanner yields n terms and n - 1 operators, and every operator is
    // one of the folded kinds, so exactly one term remains here
    match (terms.pop(), terms.is_empty() && ops.is_empty()) {
        (Some(t), true) => Ok(t),
        _ => Err(Error::malformed("Parser error.")),
    }
}

/// Splits one parenthesis level into `n` terms and `n - 1` operators
struct Scanner<'a> {
    text: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    fn run(&mut self) -> Result<(Vec<Expr>, Vec<Opcode>), Error> {
        let mut terms = vec![];
        let mut ops = vec![];
        loop {
            terms.push(self.term()?);
            if !self.skip_space() {
                break;
            }
            ops.push(self.op()?);
        }
        Ok((terms, ops))
    }

    /// Advances past whitespace, returning `false` at end of input
    fn skip_space(&mut self) -> bool {
        while self.text.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
        self.pos < self.text.len()
    }

    fn term(&mut self) -> Result<Expr, Error> {
        if !self.skip_space() {
            return Err(Error::malformed("Expected Term."));
        }
        match self.text[self.pos] {
            b'-' => {
                self.pos += 1;
                Ok(Expr::Const(0) - self.term()?)
            }
            b'0'..=b'9' => self.number(),
            b'(' => self.group(),
            b')' => Err(Error::malformed("Too many closing parentheses.")),
            b'/' => Err(Error::malformed("Division is not allowed.")),
            c => match Var::from_char(c as char) {
                Some(v) => {
                    self.pos += 1;
                    Ok(Expr::Var(v))
                }
                None => Err(Error::malformed("Unexpected character.")),
            },
        }
    }

    fn number(&mut self) -> Result<Expr, Error> {
        let mut v: i64 = 0;
        while let Some(d @ b'0'..=b'9') = self.text.get(self.pos) {
            v = v
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(d - b'0')))
                .ok_or_else(|| Error::malformed("Number too large."))?;
            self.pos += 1;
        }
        Ok(Expr::Const(v))
    }

    /// Parses a parenthesized group, starting at its opening parenthesis
    fn group(&mut self) -> Result<Expr, Error> {
        let start = self.pos + 1;
        let mut depth = 0usize;
        for (i, c) in self.text.iter().enumerate().skip(self.pos) {
            match c {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return parse_group(&self.text[start..i]);
                    }
                }
                _ => (),
            }
        }
        Err(Error::malformed("Unclosed parenthesis."))
    }

    /// Reads the operator between two terms
    ///
    /// Anything that can begin a term (other than `-`) implies a
    /// multiplication and is left in place for the next term.
    fn op(&mut self) -> Result<Opcode, Error> {
        let c = self.text[self.pos];
        match c {
            b'+' | b'-' | b'*' | b'^' => {
                self.pos += 1;
                Opcode::try_from(c as char)
            }
            b'0'..=b'9' | b'(' => Ok(Opcode::Mul),
            b')' => Err(Error::malformed("Too many closing parentheses.")),
            b'/' => Err(Error::malformed("Division is not allowed.")),
            c if Var::from_char(c as char).is_some() => Ok(Opcode::Mul),
            _ => Err(Error::malformed("Expected operator.")),
        }
    }
}

/// Folds `^` operators from right to left
fn fold_powers(
    terms: &mut Vec<Expr>,
    ops: &mut Vec<Opcode>,
) -> Result<(), Error> {
    for i in (0..ops.len()).rev() {
        if ops[i] != Opcode::Pow {
            continue;
        }
        let rhs = terms.remove(i + 1);
        if rhs.is_numeric() && rhs.eval(0.0, 0.0, 0.0, 0.0) < 0.0 {
            return Err(Error::malformed(
                "Only non-negative exponents allowed.",
            ));
        }
        let lhs = std::mem::replace(&mut terms[i], Expr::Const(0));
        terms[i] = lhs.pow(rhs);
        ops.remove(i);
    }
    Ok(())
}

/// Folds every operator matching `pred` from left to right
fn fold_left<F: Fn(Opcode) -> bool>(
    terms: &mut Vec<Expr>,
    ops: &mut Vec<Opcode>,
    pred: F,
) {
    let mut i = 0;
    while i < ops.len() {
        if pred(ops[i]) {
            let rhs = terms.remove(i + 1);
            let lhs = std::mem::replace(&mut terms[i], Expr::Const(0));
            terms[i] = Expr::binary(ops.remove(i), lhs, rhs);
        } else {
            i += 1;
        }
    }
}
