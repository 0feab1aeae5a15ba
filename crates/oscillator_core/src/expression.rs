//! Forcing-term expressions.
//!
//! A forcing term such as `3*step(t-25)` or `2sin(pi t)` is lexed into a flat token stream,
//! reduced by an operator-precedence (shunting-yard) pass into postfix `Bytecode`, and then
//! evaluated at any time `t` by a small stack machine. Lexing and reduction happen once per
//! expression; evaluation is infallible afterwards because the reduction pass has already
//! checked every operator's arity.

use crate::error::ParseError;
use std::f64::consts::{E, PI};

/// Named single-argument functions accepted in forcing terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Cbrt,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Expm1,
    Floor,
    Fround,
    Ln,
    Log10,
    Log1p,
    Log2,
    Round,
    Sin,
    Sinh,
    Step,
    Sqrt,
    Tan,
    Tanh,
}

/// Every spelling the lexer accepts, including the `arc` aliases.
const FUNCTION_NAMES: &[(&str, Function)] = &[
    ("abs", Function::Abs),
    ("acos", Function::Acos),
    ("arccos", Function::Acos),
    ("acosh", Function::Acosh),
    ("arccosh", Function::Acosh),
    ("asin", Function::Asin),
    ("arcsin", Function::Asin),
    ("asinh", Function::Asinh),
    ("arcsinh", Function::Asinh),
    ("atan", Function::Atan),
    ("arctan", Function::Atan),
    ("atanh", Function::Atanh),
    ("arctanh", Function::Atanh),
    ("cbrt", Function::Cbrt),
    ("ceil", Function::Ceil),
    ("cos", Function::Cos),
    ("cosh", Function::Cosh),
    ("exp", Function::Exp),
    ("expm1", Function::Expm1),
    ("floor", Function::Floor),
    ("fround", Function::Fround),
    ("ln", Function::Ln),
    ("log", Function::Ln),
    ("log10", Function::Log10),
    ("log1p", Function::Log1p),
    ("log2", Function::Log2),
    ("round", Function::Round),
    ("sin", Function::Sin),
    ("sinh", Function::Sinh),
    ("step", Function::Step),
    ("sqrt", Function::Sqrt),
    ("tan", Function::Tan),
    ("tanh", Function::Tanh),
];

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        FUNCTION_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, function)| function)
    }

    /// True when `text` could still grow into a function name. Lets digits
    /// join identifiers such as `log10` or `expm1`.
    fn is_name_prefix(text: &str) -> bool {
        FUNCTION_NAMES
            .iter()
            .any(|(candidate, _)| candidate.starts_with(text))
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Function::Abs => x.abs(),
            Function::Acos => x.acos(),
            Function::Acosh => x.acosh(),
            Function::Asin => x.asin(),
            Function::Asinh => x.asinh(),
            Function::Atan => x.atan(),
            Function::Atanh => x.atanh(),
            Function::Cbrt => x.cbrt(),
            Function::Ceil => x.ceil(),
            Function::Cos => x.cos(),
            Function::Cosh => x.cosh(),
            Function::Exp => x.exp(),
            Function::Expm1 => x.exp_m1(),
            Function::Floor => x.floor(),
            Function::Fround => x as f32 as f64,
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Log1p => x.ln_1p(),
            Function::Log2 => x.log2(),
            Function::Round => round_half_up(x),
            Function::Sin => x.sin(),
            Function::Sinh => x.sinh(),
            Function::Step => unit_step(x),
            Function::Sqrt => x.sqrt(),
            Function::Tan => x.tan(),
            Function::Tanh => x.tanh(),
        }
    }
}

/// Heaviside step: 0 for `x <= 0`, 1 otherwise.
pub fn unit_step(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        1.0
    }
}

/// Rounds halves toward positive infinity (`round(-2.5) == -2`).
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    E,
    Pi,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Constant::E => E,
            Constant::Pi => PI,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Literal(f64),
    /// The time variable `t`.
    Variable,
    Constant(Constant),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// Unary minus that could not be folded into a literal (`-t`, `-(t+1)`).
    Neg,
    Fn(Function),
    OpenParen,
    CloseParen,
    Terminator,
}

/// Input precedence applies while an operator is the incoming token, stack
/// precedence while it waits on the operator stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub input: u8,
    pub stack: u8,
}

impl Operator {
    pub fn precedence(self) -> Precedence {
        let (input, stack) = match self {
            Operator::Terminator => (0, 0),
            Operator::CloseParen => (1, 1),
            Operator::OpenParen => (20, 2),
            Operator::Add | Operator::Sub => (13, 13),
            Operator::Mul | Operator::Div => (14, 14),
            Operator::Neg => (20, 15),
            // Left associative: `2^3^2` is `(2^3)^2`.
            Operator::Pow => (16, 16),
            Operator::Fn(_) => (19, 19),
        };
        Precedence { input, stack }
    }

    fn arity(self) -> usize {
        match self {
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Pow => 2,
            Operator::Neg | Operator::Fn(_) => 1,
            Operator::OpenParen | Operator::CloseParen | Operator::Terminator => 0,
        }
    }

    /// Applies the operator to the top of `stack`. `false` if operands are missing.
    fn apply(self, stack: &mut Vec<f64>) -> bool {
        match self {
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Pow => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    return false;
                };
                stack.push(match self {
                    Operator::Add => a + b,
                    Operator::Sub => a - b,
                    Operator::Mul => a * b,
                    Operator::Div => a / b,
                    _ => a.powf(b),
                });
                true
            }
            Operator::Neg | Operator::Fn(_) => {
                let Some(a) = stack.pop() else {
                    return false;
                };
                stack.push(match self {
                    Operator::Fn(function) => function.apply(a),
                    _ => -a,
                });
                true
            }
            Operator::OpenParen | Operator::CloseParen | Operator::Terminator => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Operand(Operand),
    Operator(Operator),
}

impl Token {
    /// Tokens after which an adjacent operand means multiplication.
    fn ends_operand(self) -> bool {
        matches!(
            self,
            Token::Operand(_) | Token::Operator(Operator::CloseParen)
        )
    }

    fn starts_operand(self) -> bool {
        matches!(
            self,
            Token::Operand(_)
                | Token::Operator(Operator::Fn(_))
                | Token::Operator(Operator::OpenParen)
                | Token::Operator(Operator::Neg)
        )
    }
}

// --- Lexer ---

/// Splits a forcing-term string into tokens.
///
/// Digits accumulate into a literal buffer and letters into an identifier buffer; a buffer is
/// flushed whenever an operator, a parenthesis or the other buffer type shows up. Whitespace
/// is ignored entirely.
/// Implicit multiplication is inserted wherever an operand directly follows another operand or
/// a closing parenthesis (`2t`, `t(t+1)`, `(t)(t)`, `3sin(t)`).
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::default();
    for (position, ch) in input.chars().enumerate() {
        lexer.feed(position, ch)?;
    }
    lexer.finish()
}

#[derive(Default)]
struct Lexer {
    tokens: Vec<Token>,
    digits: String,
    letters: String,
    negate_pending: bool,
}

impl Lexer {
    fn feed(&mut self, position: usize, ch: char) -> Result<(), ParseError> {
        if self.negate_pending {
            if ch.is_ascii_digit() || ch == '.' {
                self.negate_pending = false;
                self.digits.push('-');
            } else if ch.is_whitespace() {
                return Ok(());
            } else {
                self.negate_pending = false;
                self.push(Token::Operator(Operator::Neg));
            }
        }

        match ch {
            // Skipped without flushing, so `2 3` is the literal `23`.
            c if c.is_whitespace() => {}
            c if c.is_ascii_digit() => {
                if !self.letters.is_empty() {
                    let mut candidate = self.letters.clone();
                    candidate.push(c);
                    if Function::is_name_prefix(&candidate) {
                        self.letters = candidate;
                        return Ok(());
                    }
                    self.flush_letters()?;
                }
                self.digits.push(c);
            }
            '.' => {
                self.flush_letters()?;
                self.digits.push('.');
            }
            c if c.is_ascii_alphabetic() => {
                self.flush_digits()?;
                self.letters.push(c);
            }
            '+' | '*' | '/' | '^' => {
                self.flush_digits()?;
                self.flush_letters()?;
                self.push(Token::Operator(match ch {
                    '+' => Operator::Add,
                    '*' => Operator::Mul,
                    '/' => Operator::Div,
                    _ => Operator::Pow,
                }));
            }
            '-' => {
                self.flush_digits()?;
                self.flush_letters()?;
                if self.in_unary_position() {
                    self.negate_pending = true;
                } else {
                    self.push(Token::Operator(Operator::Sub));
                }
            }
            '(' => {
                self.flush_digits()?;
                if !self.letters.is_empty() {
                    let letters = std::mem::take(&mut self.letters);
                    self.resolve_call(&letters)?;
                }
                self.push(Token::Operator(Operator::OpenParen));
            }
            ')' => {
                self.flush_digits()?;
                self.flush_letters()?;
                self.push(Token::Operator(Operator::CloseParen));
            }
            _ => return Err(ParseError::UnexpectedCharacter { ch, position }),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Token>, ParseError> {
        self.flush_digits()?;
        self.flush_letters()?;
        if self.negate_pending {
            self.push(Token::Operator(Operator::Neg));
        }
        Ok(self.tokens)
    }

    /// A `-` is unary at the start or right after any operator except `)`.
    fn in_unary_position(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(Token::Operator(Operator::CloseParen)) => false,
            Some(Token::Operator(_)) => true,
            Some(Token::Operand(_)) => false,
        }
    }

    fn push(&mut self, token: Token) {
        if token.starts_operand() {
            if let Some(last) = self.tokens.last() {
                if last.ends_operand() {
                    self.tokens.push(Token::Operator(Operator::Mul));
                }
            }
        }
        self.tokens.push(token);
    }

    fn flush_digits(&mut self) -> Result<(), ParseError> {
        if self.digits.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.digits);
        let value: f64 = text
            .parse()
            .map_err(|_| ParseError::MalformedNumber(text.clone()))?;
        self.push(Token::Operand(Operand::Literal(value)));
        Ok(())
    }

    /// Flushes letters that are not followed by `(`: they must spell out a run of
    /// `t`, `e` and `pi`.
    fn flush_letters(&mut self) -> Result<(), ParseError> {
        if self.letters.is_empty() {
            return Ok(());
        }
        let letters = std::mem::take(&mut self.letters);
        let operands = split_constants(&letters)
            .ok_or_else(|| ParseError::UnknownIdentifier(letters.clone()))?;
        for operand in operands {
            self.push(Token::Operand(operand));
        }
        Ok(())
    }

    /// Letters directly before `(`. The longest trailing function name wins, and whatever
    /// precedes it must be constants (`tsin(` is `t*sin(`). With no function name at all the
    /// letters are constants multiplying the group (`t(t+1)`).
    fn resolve_call(&mut self, letters: &str) -> Result<(), ParseError> {
        for split in 0..letters.len() {
            let (prefix, name) = letters.split_at(split);
            let Some(function) = Function::from_name(name) else {
                continue;
            };
            let Some(operands) = split_constants(prefix) else {
                continue;
            };
            for operand in operands {
                self.push(Token::Operand(operand));
            }
            self.push(Token::Operator(Operator::Fn(function)));
            return Ok(());
        }

        let operands = split_constants(letters)
            .ok_or_else(|| ParseError::UnknownIdentifier(letters.to_string()))?;
        for operand in operands {
            self.push(Token::Operand(operand));
        }
        Ok(())
    }
}

/// Splits `tpie` into `[t, pi, e]`; `None` when any letter is left over.
fn split_constants(letters: &str) -> Option<Vec<Operand>> {
    let mut operands = Vec::new();
    let mut rest = letters;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("pi") {
            operands.push(Operand::Constant(Constant::Pi));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('t') {
            operands.push(Operand::Variable);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('e') {
            operands.push(Operand::Constant(Constant::E));
            rest = tail;
        } else {
            return None;
        }
    }
    Some(operands)
}

// --- Operator-precedence reduction ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Load(Operand),
    Apply(Operator),
}

/// Postfix program produced by the precedence pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<Instruction>,
}

/// Runs the shunting-yard pass over `tokens`.
///
/// The operator stack starts with a terminator. An operator waiting on the stack is reduced
/// while its stack precedence is at least the incoming operator's input precedence; otherwise
/// the incoming operator is pushed. A closing parenthesis reduces down to its matching opening
/// parenthesis and both are discarded. Each reduction is emitted as an `Apply` instruction and
/// the data-stack depth is tracked so that arity errors surface here rather than at evaluation.
pub fn reduce(tokens: &[Token]) -> Result<Bytecode, ParseError> {
    let mut operators = vec![Operator::Terminator];
    let mut ops = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;

    let stream = tokens
        .iter()
        .copied()
        .chain(std::iter::once(Token::Operator(Operator::Terminator)));

    for token in stream {
        let incoming = match token {
            Token::Operand(operand) => {
                ops.push(Instruction::Load(operand));
                depth += 1;
                continue;
            }
            Token::Operator(operator) => operator,
        };

        loop {
            let Some(&top) = operators.last() else {
                return Err(ParseError::MismatchedParenthesis);
            };
            if top.precedence().stack < incoming.precedence().input {
                if incoming == Operator::CloseParen {
                    // Only the terminator sits below: nothing left to match.
                    return Err(ParseError::MismatchedParenthesis);
                }
                operators.push(incoming);
                break;
            }

            operators.pop();
            match top {
                Operator::OpenParen if incoming == Operator::CloseParen => break,
                Operator::OpenParen => return Err(ParseError::MismatchedParenthesis),
                Operator::Terminator => break,
                operator => {
                    let arity = operator.arity();
                    if depth < arity {
                        return Err(ParseError::MissingOperand);
                    }
                    depth = depth + 1 - arity;
                    ops.push(Instruction::Apply(operator));
                }
            }
        }
    }

    match depth {
        0 if ops.is_empty() => Err(ParseError::EmptyExpression),
        0 => Err(ParseError::MissingOperand),
        1 => Ok(Bytecode { ops }),
        _ => Err(ParseError::DanglingOperand),
    }
}

/// Stack machine for reduced forcing-term programs.
pub struct VM;

impl VM {
    /// Evaluates `bytecode` with the time variable bound to `t`, reusing `stack` as scratch space.
    pub fn execute(bytecode: &Bytecode, t: f64, stack: &mut Vec<f64>) -> f64 {
        stack.clear();
        for instruction in &bytecode.ops {
            match *instruction {
                Instruction::Load(Operand::Literal(value)) => stack.push(value),
                Instruction::Load(Operand::Variable) => stack.push(t),
                Instruction::Load(Operand::Constant(constant)) => stack.push(constant.value()),
                Instruction::Apply(operator) => {
                    if !operator.apply(stack) {
                        return f64::NAN;
                    }
                }
            }
        }
        stack.pop().unwrap_or(f64::NAN)
    }
}

/// A validated forcing term, ready to be evaluated at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    bytecode: Bytecode,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let bytecode = reduce(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            bytecode,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn eval(&self, t: f64) -> f64 {
        let mut stack = Vec::with_capacity(8);
        self.eval_with(t, &mut stack)
    }

    /// Same as `eval`, with a caller-owned scratch stack.
    pub fn eval_with(&self, t: f64, stack: &mut Vec<f64>) -> f64 {
        VM::execute(&self.bytecode, t, stack)
    }
}

/// One-shot parse and evaluation of `expr` at time `t`.
pub fn evaluate(expr: &str, t: f64) -> Result<f64, ParseError> {
    Ok(Expression::parse(expr)?.eval(t))
}

/// True when the forcing term is blank or a literal zero (`0`, `0.0`, `-0`).
pub fn is_zero_forcing(expr: &str) -> bool {
    let trimmed = expr.trim();
    trimmed.is_empty() || trimmed.parse::<f64>().map_or(false, |value| value == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, t: f64) -> f64 {
        evaluate(expr, t).expect("expression should evaluate")
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn evaluate_respects_operator_precedence() {
        assert_eq!(eval("2+3*4", 0.0), 14.0);
        assert_eq!(eval("(2+3)*4", 0.0), 20.0);
        assert_eq!(eval("10-4-3", 0.0), 3.0);
        assert_eq!(eval("8/4/2", 0.0), 1.0);
        assert_eq!(eval("2*3^2", 0.0), 18.0);
    }

    #[test]
    fn evaluate_exponent_is_left_associative() {
        assert_eq!(eval("2^3^2", 0.0), 64.0);
        assert_eq!(eval("t^2^3", 2.0), 64.0);
        assert_eq!(eval("-t^2", 3.0), -9.0);
        assert_eq!(eval("-2^2", 0.0), 4.0);
    }

    #[test]
    fn whitespace_does_not_split_literals() {
        assert_eq!(eval("2 3", 0.0), 23.0);
        assert_eq!(eval(" 1 2 . 5 ", 0.0), 12.5);
        assert_eq!(eval("2 t", 4.0), 8.0);
        assert_eq!(eval("si n(0) + 1", 0.0), 1.0);
    }

    #[test]
    fn evaluate_closing_paren_stops_at_matching_open() {
        assert_eq!(eval("2-(3)*4", 0.0), -10.0);
        assert_eq!(eval("2*(3+(4-1))^2", 0.0), 72.0);
    }

    #[test]
    fn evaluate_functions_and_constants() {
        assert_eq!(eval("sin(0)", 0.0), 0.0);
        assert_close(eval("cos(pi)", 0.0), -1.0);
        assert_close(eval("ln(e)", 0.0), 1.0);
        assert_close(eval("log10(1000)", 0.0), 3.0);
        assert_close(eval("log2(8)", 0.0), 3.0);
        assert_close(eval("log1p(0)", 0.0), 0.0);
        assert_close(eval("expm1(0)", 0.0), 0.0);
        assert_close(eval("arctan(1)*4", 0.0), std::f64::consts::PI);
        assert_close(eval("sqrt(16)+cbrt(27)", 0.0), 7.0);
        assert_close(eval("tanh(0)+cosh(0)", 0.0), 1.0);
        assert_close(eval("sin(t)^2+cos(t)^2", 1.3), 1.0);
    }

    #[test]
    fn evaluate_step_function() {
        assert_eq!(eval("step(t-25)", 30.0), 1.0);
        assert_eq!(eval("step(t-25)", 10.0), 0.0);
        assert_eq!(eval("step(t-25)", 25.0), 0.0);
        assert_eq!(eval("3*step(t-25)", 30.0), 3.0);
    }

    #[test]
    fn evaluate_implicit_multiplication() {
        assert_eq!(eval("2t", 5.0), 10.0);
        assert_eq!(eval("t(t+1)", 3.0), 12.0);
        assert_eq!(eval("(t)(t)", 3.0), 9.0);
        assert_eq!(eval("2(3)", 0.0), 6.0);
        assert_close(eval("3sin(t)", 0.5), 3.0 * 0.5_f64.sin());
        assert_close(eval("2pi t", 1.5), 3.0 * std::f64::consts::PI);
        assert_close(eval("te", 2.0), 2.0 * std::f64::consts::E);
        assert_close(eval("tsin(t)", 2.0), 2.0 * 2.0_f64.sin());
    }

    #[test]
    fn evaluate_unary_minus() {
        assert_eq!(eval("-3+5", 0.0), 2.0);
        assert_eq!(eval("2*-3", 0.0), -6.0);
        assert_eq!(eval("-t", 4.0), -4.0);
        assert_eq!(eval("-t^2", 3.0), -9.0);
        assert_eq!(eval("2^-t", 1.0), 0.5);
        assert_eq!(eval("-(t+1)", 1.0), -2.0);
        assert_eq!(eval("--2", 0.0), 2.0);
        assert_eq!(eval("- 2.5", 0.0), -2.5);
        assert_close(eval("-sin(t)", 1.0), -(1.0_f64.sin()));
    }

    #[test]
    fn evaluate_decimal_literals() {
        assert_eq!(eval("0.5t", 4.0), 2.0);
        assert_eq!(eval(".25*4", 0.0), 1.0);
    }

    #[test]
    fn round_and_fround_follow_platform_rules() {
        assert_eq!(eval("round(2.5)", 0.0), 3.0);
        assert_eq!(eval("round(-2.5)", 0.0), -2.0);
        assert_eq!(eval("round(0.49999999999999994)", 0.0), 0.0);
        assert_eq!(eval("fround(0.1)", 0.0), 0.1_f32 as f64);
    }

    #[test]
    fn tokenize_prefers_function_names_over_constants() {
        let tokens = tokenize("tan(t)").expect("tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Operator(Operator::Fn(Function::Tan)),
                Token::Operator(Operator::OpenParen),
                Token::Operand(Operand::Variable),
                Token::Operator(Operator::CloseParen),
            ]
        );

        let tokens = tokenize("exp(1)").expect("tokenize");
        assert_eq!(tokens[0], Token::Operator(Operator::Fn(Function::Exp)));
    }

    #[test]
    fn tokenize_inserts_implicit_multiply_before_constants() {
        let tokens = tokenize("2t").expect("tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Operand(Operand::Literal(2.0)),
                Token::Operator(Operator::Mul),
                Token::Operand(Operand::Variable),
            ]
        );
    }

    #[test]
    fn parse_rejects_invalid_input() {
        assert!(matches!(
            evaluate("2+@", 0.0),
            Err(ParseError::UnexpectedCharacter { ch: '@', position: 2 })
        ));
        assert!(matches!(
            evaluate("foo(t)", 0.0),
            Err(ParseError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            evaluate("x+1", 0.0),
            Err(ParseError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            evaluate("(t+1", 0.0),
            Err(ParseError::MismatchedParenthesis)
        ));
        assert!(matches!(
            evaluate("t+1)", 0.0),
            Err(ParseError::MismatchedParenthesis)
        ));
        assert!(matches!(evaluate("2+", 0.0), Err(ParseError::MissingOperand)));
        assert!(matches!(evaluate("*3", 0.0), Err(ParseError::MissingOperand)));
        assert!(matches!(evaluate("", 0.0), Err(ParseError::EmptyExpression)));
        assert!(matches!(
            evaluate("1.2.3", 0.0),
            Err(ParseError::MalformedNumber(_))
        ));
        assert!(matches!(evaluate("sin t", 0.0), Err(ParseError::UnknownIdentifier(_))));
    }

    #[test]
    fn expression_reuses_bytecode_across_times() {
        let expression = Expression::parse("3*step(t-25)").expect("parse");
        let mut stack = Vec::new();
        assert_eq!(expression.eval_with(10.0, &mut stack), 0.0);
        assert_eq!(expression.eval_with(30.0, &mut stack), 3.0);
        assert_eq!(expression.source(), "3*step(t-25)");
        assert!(!expression.bytecode().ops.is_empty());
    }

    #[test]
    fn zero_forcing_detection() {
        assert!(is_zero_forcing("0"));
        assert!(is_zero_forcing(" 0.0 "));
        assert!(is_zero_forcing("-0"));
        assert!(is_zero_forcing(""));
        assert!(!is_zero_forcing("0*t"));
        assert!(!is_zero_forcing("sin(t)"));
    }
}
