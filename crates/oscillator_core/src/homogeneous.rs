//! Closed-form solution of `m x'' + d x' + k x = 0`.
//!
//! The damping regime picks a fundamental pair `{s1, s2}`; the free coefficients `A, B` of
//! `x(t) = A s1(t) + B s2(t)` are fixed by the initial conditions through the 2x2 system
//!
//! ```text
//! s1(t0) A + s2(t0) B = x0
//! s1'(t0) A + s2'(t0) B = v0
//! ```

use crate::cache::{SampleCache, TimeKey};
use crate::error::{EngineError, EngineResult};
use crate::oscillator::{DampingClass, Roots};
use nalgebra::{Matrix2x3, RowVector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Shape of the fundamental solution pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionType {
    /// `{cos(wt), sin(wt)}`
    PureImaginary,
    /// `{e^{rt} cos(wt), e^{rt} sin(wt)}`
    ComplexConjugate,
    /// `{e^{r1 t}, e^{r2 t}}`
    RealDistinct,
    /// `{e^{rt}, t e^{rt}}`
    RealRepeated,
}

impl SolutionType {
    pub fn from_classification(class: DampingClass, roots: &Roots) -> Self {
        match class {
            DampingClass::Undamped if roots.imag != 0.0 => SolutionType::PureImaginary,
            DampingClass::UnderDamped => SolutionType::ComplexConjugate,
            DampingClass::CriticallyDamped => SolutionType::RealRepeated,
            DampingClass::Undamped | DampingClass::OverDamped => {
                if roots.r1 == roots.r2 {
                    SolutionType::RealRepeated
                } else {
                    SolutionType::RealDistinct
                }
            }
        }
    }
}

/// The basis functions of the homogeneous solution space for one damping regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSet {
    pub solution_type: SolutionType,
    pub roots: Roots,
}

impl FundamentalSet {
    pub fn new(class: DampingClass, roots: Roots) -> Self {
        Self {
            solution_type: SolutionType::from_classification(class, &roots),
            roots,
        }
    }

    /// `[s1(t), s2(t)]`
    pub fn basis(&self, t: f64) -> [f64; 2] {
        let Roots { r1, r2, imag } = self.roots;
        match self.solution_type {
            SolutionType::PureImaginary => [(imag * t).cos(), (imag * t).sin()],
            SolutionType::ComplexConjugate => {
                let growth = (r1 * t).exp();
                [growth * (imag * t).cos(), growth * (imag * t).sin()]
            }
            SolutionType::RealDistinct => [(r1 * t).exp(), (r2 * t).exp()],
            SolutionType::RealRepeated => {
                let growth = (r1 * t).exp();
                [growth, t * growth]
            }
        }
    }

    /// `[s1'(t), s2'(t)]`
    pub fn derivatives(&self, t: f64) -> [f64; 2] {
        let Roots { r1, r2, imag } = self.roots;
        match self.solution_type {
            SolutionType::PureImaginary => {
                [-imag * (imag * t).sin(), imag * (imag * t).cos()]
            }
            SolutionType::ComplexConjugate => {
                let growth = (r1 * t).exp();
                let (sin, cos) = (imag * t).sin_cos();
                [
                    growth * (r1 * cos - imag * sin),
                    growth * (r1 * sin + imag * cos),
                ]
            }
            SolutionType::RealDistinct => [r1 * (r1 * t).exp(), r2 * (r2 * t).exp()],
            SolutionType::RealRepeated => {
                let growth = (r1 * t).exp();
                [r1 * growth, growth + r1 * t * growth]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub a: f64,
    pub b: f64,
}

/// How the coefficient system was solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolvePath {
    /// `s1(t0) == 0`: `B` from the position equation, then `A`.
    FirstBasisVanishes,
    /// `s2(t0) == 0`: `A` from the position equation, then `B`.
    SecondBasisVanishes,
    /// Gauss-Jordan elimination of the augmented matrix.
    GaussJordan,
}

fn checked_quotient(numerator: f64, denominator: f64, what: &'static str) -> EngineResult<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(EngineError::NumericDegenerate { what });
    }
    let quotient = numerator / denominator;
    if !quotient.is_finite() {
        return Err(EngineError::NumericDegenerate { what });
    }
    Ok(quotient)
}

/// Solves for `A, B` given the basis `s` and its derivative `ds` at `t0`.
///
/// The two fast paths are exact rearrangements of the same system, so all three paths agree
/// up to rounding whenever more than one of them applies.
pub fn solve_coefficients(
    s: [f64; 2],
    ds: [f64; 2],
    x0: f64,
    v0: f64,
) -> EngineResult<(Coefficients, SolvePath)> {
    if s.iter().chain(ds.iter()).any(|value| !value.is_finite()) {
        return Err(EngineError::NumericDegenerate {
            what: "fundamental solutions are not finite at t0",
        });
    }

    if s[0] == 0.0 {
        let b = checked_quotient(x0, s[1], "both fundamental solutions vanish at t0")?;
        let a = checked_quotient(v0 - b * ds[1], ds[0], "first derivative vanishes at t0")?;
        return Ok((Coefficients { a, b }, SolvePath::FirstBasisVanishes));
    }
    if s[1] == 0.0 {
        let a = checked_quotient(x0, s[0], "first fundamental solution vanishes at t0")?;
        let b = checked_quotient(v0 - a * ds[0], ds[1], "second derivative vanishes at t0")?;
        return Ok((Coefficients { a, b }, SolvePath::SecondBasisVanishes));
    }

    let augmented = Matrix2x3::new(s[0], s[1], x0, ds[0], ds[1], v0);
    let reduced = gauss_jordan(augmented)?;
    Ok((
        Coefficients {
            a: reduced[(0, 2)],
            b: reduced[(1, 2)],
        },
        SolvePath::GaussJordan,
    ))
}

/// Brings a 2x3 augmented matrix to reduced row-echelon form.
///
/// Rows are swapped first when the second row has the larger leading entry, so a leading
/// entry that is merely close to zero does not blow up the elimination.
pub fn gauss_jordan(matrix: Matrix2x3<f64>) -> EngineResult<Matrix2x3<f64>> {
    let mut m = matrix;
    if m[(1, 0)].abs() > m[(0, 0)].abs() {
        m.swap_rows(0, 1);
    }
    let pivot = m[(0, 0)];
    if pivot == 0.0 {
        return Err(EngineError::NumericDegenerate {
            what: "first column of the coefficient matrix is zero",
        });
    }

    let top: RowVector3<f64> = m.row(0).into_owned() / pivot;
    let bottom: RowVector3<f64> = m.row(1).into_owned() - top * m[(1, 0)];

    let second_pivot = bottom[1];
    if second_pivot == 0.0 || !second_pivot.is_finite() {
        return Err(EngineError::NumericDegenerate {
            what: "coefficient matrix is singular",
        });
    }
    let bottom = bottom / second_pivot;
    let top = top - bottom * top[1];

    m.set_row(0, &top);
    m.set_row(1, &bottom);
    if m.iter().any(|value| !value.is_finite()) {
        return Err(EngineError::NumericDegenerate {
            what: "coefficient elimination overflowed",
        });
    }
    Ok(m)
}

/// Everything a renderer needs to write `x(t)` down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolicSolution {
    pub solution_type: SolutionType,
    pub coefficients: Coefficients,
    pub roots: Roots,
}

/// Closed-form position/velocity evaluator with memoized samples.
#[derive(Debug, Clone)]
pub struct HomogeneousSolution {
    fundamental: FundamentalSet,
    coefficients: Coefficients,
    path: SolvePath,
    cache: SampleCache,
    evaluations: usize,
}

impl HomogeneousSolution {
    pub fn new(
        class: DampingClass,
        roots: Roots,
        t0: f64,
        x0: f64,
        v0: f64,
    ) -> EngineResult<Self> {
        let fundamental = FundamentalSet::new(class, roots);
        let (coefficients, path) = solve_coefficients(
            fundamental.basis(t0),
            fundamental.derivatives(t0),
            x0,
            v0,
        )?;
        debug!(
            solution_type = ?fundamental.solution_type,
            a = coefficients.a,
            b = coefficients.b,
            path = ?path,
            "solved homogeneous coefficients"
        );

        // A t0 too large to key is simply not cached; queries at it fail on their own.
        let cache = match TimeKey::new(t0) {
            Ok(key) => SampleCache::seeded(key, x0, v0),
            Err(_) => SampleCache::new(),
        };

        Ok(Self {
            fundamental,
            coefficients,
            path,
            cache,
            evaluations: 0,
        })
    }

    pub fn fundamental_set(&self) -> &FundamentalSet {
        &self.fundamental
    }

    pub fn solution_type(&self) -> SolutionType {
        self.fundamental.solution_type
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    pub fn solve_path(&self) -> SolvePath {
        self.path
    }

    pub fn symbolic(&self) -> SymbolicSolution {
        SymbolicSolution {
            solution_type: self.fundamental.solution_type,
            coefficients: self.coefficients,
            roots: self.fundamental.roots,
        }
    }

    /// Number of closed-form evaluations performed on cache misses.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// `x(t)` without touching the cache.
    pub fn position_at(&self, t: f64) -> f64 {
        let [s1, s2] = self.fundamental.basis(t);
        self.coefficients.a * s1 + self.coefficients.b * s2
    }

    /// `x'(t)` without touching the cache.
    pub fn velocity_at(&self, t: f64) -> f64 {
        let [ds1, ds2] = self.fundamental.derivatives(t);
        self.coefficients.a * ds1 + self.coefficients.b * ds2
    }

    pub fn position(&mut self, t: f64) -> EngineResult<f64> {
        let key = TimeKey::new(t)?;
        if let Some(x) = self.cache.position(key) {
            trace!(t, "position cache hit");
            return Ok(x);
        }
        let x = self.position_at(t);
        self.evaluations += 1;
        self.cache.insert_position(key, x);
        Ok(x)
    }

    pub fn velocity(&mut self, t: f64) -> EngineResult<f64> {
        let key = TimeKey::new(t)?;
        if let Some(v) = self.cache.velocity(key) {
            trace!(t, "velocity cache hit");
            return Ok(v);
        }
        let v = self.velocity_at(t);
        self.evaluations += 1;
        self.cache.insert_velocity(key, v);
        Ok(v)
    }
}

// --- Plain-text rendering ---

/// Number formatting used in rendered formulas: `1` and `-1` collapse to `""` and `"-"`,
/// integers print as-is, everything else gets two decimals with one trailing zero trimmed.
pub fn format_coefficient(x: f64) -> String {
    if x == 1.0 {
        String::new()
    } else if x == -1.0 {
        "-".to_string()
    } else {
        format_number(x)
    }
}

/// Like [`format_coefficient`], but `1` and `-1` stay visible.
pub fn format_number(x: f64) -> String {
    if x == 0.0 {
        "0".to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        let mut text = format!("{:.2}", x);
        if text.ends_with('0') {
            text.pop();
        }
        text
    }
}

/// `e^{rt}`, or nothing when `r == 0`.
fn exponential(r: f64) -> String {
    if r == 0.0 {
        String::new()
    } else {
        format!("e^{{{}t}}", format_coefficient(r))
    }
}

fn trig(name: &str, w: f64) -> String {
    format!("{}({}t)", name, format_coefficient(w))
}

impl FundamentalSet {
    fn basis_labels(&self) -> [String; 2] {
        let Roots { r1, r2, imag } = self.roots;
        match self.solution_type {
            SolutionType::PureImaginary => [trig("cos", imag), trig("sin", imag)],
            SolutionType::ComplexConjugate => [
                format!("{}{}", exponential(r1), trig("cos", imag)),
                format!("{}{}", exponential(r1), trig("sin", imag)),
            ],
            SolutionType::RealDistinct => [exponential(r1), exponential(r2)],
            SolutionType::RealRepeated => [exponential(r1), format!("t{}", exponential(r1))],
        }
    }
}

fn label_or_one(label: &str) -> &str {
    if label.is_empty() {
        "1"
    } else {
        label
    }
}

impl fmt::Display for FundamentalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [first, second] = self.basis_labels();
        write!(f, "{{{}, {}}}", label_or_one(&first), label_or_one(&second))
    }
}

fn term(coefficient: f64, label: &str) -> String {
    if label.is_empty() {
        format_number(coefficient)
    } else {
        format!("{}{}", format_coefficient(coefficient), label)
    }
}

impl fmt::Display for SymbolicSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fundamental = FundamentalSet {
            solution_type: self.solution_type,
            roots: self.roots,
        };
        let [first, second] = fundamental.basis_labels();
        let Coefficients { a, b } = self.coefficients;

        write!(f, "x(t) = ")?;
        match (a == 0.0, b == 0.0) {
            (true, true) => write!(f, "0"),
            (false, true) => write!(f, "{}", term(a, &first)),
            (true, false) => write!(f, "{}", term(b, &second)),
            (false, false) if b < 0.0 => {
                write!(f, "{} - {}", term(a, &first), term(b.abs(), &second))
            }
            (false, false) => write!(f, "{} + {}", term(a, &first), term(b, &second)),
        }
    }
}
